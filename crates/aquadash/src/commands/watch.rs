//! Live watching: subscribe through the dashboard and print every update
//! the engine accepts until interrupted.

use tracing::{debug, info};

use aquadash_config::Config;
use aquadash_core::{Dashboard, Fetcher, Reading, Subscription};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output::{self, ReadingView};

pub async fn handle(args: WatchArgs, config: Config, global: &GlobalOpts) -> Result<(), CliError> {
    let site = config.site(&args.site)?;
    let device = match args.device.as_deref() {
        Some(name) => {
            let device = site.device(&args.site, name)?;
            Some((device.url()?, device.field.clone()))
        }
        None => None,
    };

    let dashboard = super::dashboard(config, global)?;
    let result = match device {
        Some((url, field)) => {
            let source = format!("{}/{}", args.site, args.device.as_deref().unwrap_or_default());
            let sub = dashboard.subscribe_device(url, field);
            follow(&dashboard, sub, &source, &args, global).await
        }
        None => {
            let sub = dashboard
                .subscribe_site(&args.site)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "polled group for site".into(),
                    identifier: args.site.clone(),
                    list_command: "sites".into(),
                })?;
            follow(&dashboard, sub, &args.site, &args, global).await
        }
    };

    dashboard.dispose();
    result
}

async fn follow<F>(
    dashboard: &Dashboard,
    mut sub: Subscription<F>,
    source: &str,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    F: Fetcher<Value = Reading>,
{
    let color = output::should_color(global.color);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            next = sub.changed() => {
                let Some(snapshot) = next else {
                    debug!(key = sub.key(), "subscription closed");
                    break;
                };
                let view = ReadingView::from_snapshot(source, &snapshot);
                let out = output::render_reading(global.output, &view, color)?;
                output::print_output(&out, global.quiet);
                printed += 1;

                if args.real_time && printed == 1 && dashboard.set_real_time(true) {
                    info!("real-time mode enabled");
                }
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}
