//! Site listing.

use serde::Serialize;
use tabled::Tabled;

use aquadash_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SiteSummary<'a> {
    id: &'a str,
    name: &'a str,
    groups: usize,
    fields: usize,
    devices: Vec<&'a str>,
    controls: Vec<&'a str>,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Groups")]
    groups: usize,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Devices")]
    devices: String,
    #[tabled(rename = "Controls")]
    controls: String,
}

pub fn handle(config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let summaries: Vec<SiteSummary<'_>> = config
        .sites
        .iter()
        .map(|(id, site)| SiteSummary {
            id,
            name: site.display_name(id),
            groups: site.groups.len(),
            fields: site.groups.iter().map(|g| g.fields.len()).sum(),
            devices: site.devices.iter().map(|d| d.name.as_str()).collect(),
            controls: site.controls.iter().map(|c| c.name.as_str()).collect(),
        })
        .collect();

    let out = output::render_list(
        global.output,
        &summaries,
        |s| SiteRow {
            id: s.id.to_owned(),
            name: s.name.to_owned(),
            groups: s.groups,
            fields: s.fields,
            devices: s.devices.join(", "),
            controls: s.controls.join(", "),
        },
        |s| s.id.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
