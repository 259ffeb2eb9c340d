//! Clean command - remove the local policy cache

use crate::cache::{CacheManager, CacheRoot};
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, UiContext};

/// Execute the clean command
///
/// Cleanup is best effort, so this never fails once the root is known.
pub async fn execute(config: &Config, root: CacheRoot) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let manager = CacheManager::from_config(root, config);
    let existed = manager.root().path().exists();

    manager.teardown().await;

    if !existed {
        ui::step_ok(&ctx, "No policy cache to remove");
    } else if manager.root().path().exists() {
        ui::step_warn_hint(
            &ctx,
            &format!(
                "Could not fully remove {}",
                manager.root().path().display()
            ),
            "Run with -vv for details",
        );
    } else {
        ui::step_ok(
            &ctx,
            &format!("Removed {}", manager.root().path().display()),
        );
    }

    Ok(())
}
