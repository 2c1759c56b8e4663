//! Binary control writes.

use tracing::info;

use aquadash_config::Config;

use crate::cli::{ControlArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ControlArgs, config: Config, global: &GlobalOpts) -> Result<(), CliError> {
    let url = config
        .site(&args.site)?
        .control(&args.site, &args.control)?
        .url()?;
    let on = args.state.is_on();

    let dashboard = super::dashboard(config, global)?;
    let echoed = dashboard.write_control(&url, on).await?;
    info!(site = %args.site, control = %args.control, on, "control written");

    let out = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::json!({
            "site": args.site,
            "control": args.control,
            "value": echoed,
        })
        .to_string(),
        OutputFormat::Plain => output::display_value(&echoed),
        OutputFormat::Table => format!(
            "{}/{} set to {}",
            args.site,
            args.control,
            if on { "on" } else { "off" }
        ),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
