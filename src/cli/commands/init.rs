//! Init command - populate the local policy cache

use crate::cache::{CacheManager, CacheRoot, InitOptions, InitReport};
use crate::cli::args::InitArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the init command
pub async fn execute(args: InitArgs, config: &Config, root: CacheRoot) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let manager = CacheManager::from_config(root, config);

    let options = InitOptions {
        organization_id: args.org.or_else(|| config.api.org.clone()),
        custom_rules_path: args.rules,
    };

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Downloading policy bundles...");

    let report = match manager.initialize(&options).await {
        Ok(report) => report,
        Err(e) => {
            spinner.stop_error("Policy cache initialization failed");
            return Err(e);
        }
    };

    if report.is_degraded() {
        spinner.stop_warn("Policy cache ready without some custom rules");
    } else {
        spinner.stop("Policy cache ready");
    }

    print_report(&ctx, &manager, &report);
    Ok(())
}

fn print_report(ctx: &UiContext, manager: &CacheManager, report: &InitReport) {
    for err in &report.degraded {
        match err.hint() {
            Some(hint) => ui::step_warn_hint(ctx, &err.user_message(), hint),
            None => ui::step_warn(ctx, &err.user_message()),
        }
    }

    for pass in report.custom_passes.iter().chain(report.default_pass.iter()) {
        ui::key_value(
            ctx,
            &pass.origin,
            &format!("{} files", pass.summary.files),
        );
    }

    ui::remark(
        ctx,
        &format!(
            "{} files written to {}",
            report.files_written(),
            manager.root().path().display()
        ),
    );
}
