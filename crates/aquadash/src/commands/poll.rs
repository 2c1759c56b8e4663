//! One-shot device poll.

use aquadash_config::Config;

use crate::cli::{GlobalOpts, PollArgs};
use crate::error::CliError;
use crate::output::{self, ReadingView};

pub async fn handle(args: PollArgs, config: Config, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = super::dashboard(config, global)?;
    let reading = dashboard
        .poll_once(&args.url, args.field.as_deref())
        .await?;

    let source = args.url.to_string();
    let view = ReadingView::one_shot(&source, &reading);
    let out = output::render_reading(global.output, &view, output::should_color(global.color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
