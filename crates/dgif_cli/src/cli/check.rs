use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use dgif_core::tools::DependencyReport;

use super::AppContext;

#[derive(Parser, Debug)]
pub struct CheckCommand;

impl CheckCommand {
    pub fn run(self, app: &AppContext) -> Result<ExitCode> {
        let report = DependencyReport::collect(&app.settings.tools);
        println!("External tools:");
        print!("{}", report);

        if report.all_required_found() {
            if !app.settings.tools.prefer_gifski {
                println!("gifski is disabled in the config (tools.prefer_gifski = false)");
            }
            return Ok(ExitCode::SUCCESS);
        }

        let missing: Vec<String> = report
            .missing_required()
            .iter()
            .map(|t| t.to_string())
            .collect();
        eprintln!("Missing required tools: {}", missing.join(", "));
        Ok(ExitCode::FAILURE)
    }
}
