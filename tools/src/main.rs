//! funnel-runner: headless driver for the funnel projection engine.
//!
//! Usage:
//!   funnel-runner --scenarios 2
//!   funnel-runner --data-dir ./data --ipc-mode

use anyhow::Result;
use funnel_core::{
    config::FunnelConfig,
    inputs::{InputField, Inputs},
    scenario::{Scenario, ScenarioBook},
    Requirement,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    AddScenario {
        #[serde(default)]
        name: Option<String>,
    },
    SetField {
        scenario_id: String,
        field: String,
        value: f64,
    },
    ReplaceInputs {
        scenario_id: String,
        inputs: Inputs,
    },
    Rename {
        scenario_id: String,
        name: String,
    },
    Reset {
        scenario_id: String,
    },
    Remove {
        scenario_id: String,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    active_template: &'a str,
    scenarios: Vec<&'a Scenario>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let scenario_count = parse_arg(&args, "--scenarios", 1usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str());

    let config = match data_dir {
        Some(dir) => FunnelConfig::load(dir)?,
        None => FunnelConfig::default(),
    };

    if !ipc_mode {
        println!("Funnel ROI calculator — funnel-runner");
        println!("  data_dir:  {}", data_dir.unwrap_or("(built-in defaults)"));
        println!(
            "  template:  {} ({})",
            config.active_template,
            config.template()?.label
        );
        println!("  scenarios: {scenario_count}");
        println!();
    }

    let mut book = ScenarioBook::new(config)?;
    for _ in 0..scenario_count {
        book.add(None)?;
    }

    if ipc_mode {
        run_ipc_loop(&mut book)?;
    } else {
        let template = &book.config().template()?.label;
        let mut stdout = io::stdout();
        for scenario in book.iter() {
            write_summary(&mut stdout, scenario, template)?;
        }
    }

    Ok(())
}

fn run_ipc_loop(book: &mut ScenarioBook) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        match handle_command(book, cmd) {
            Ok(()) => {
                let state = build_ui_state(book);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            Err(e) => {
                log::warn!("command failed: {e}");
                write_error(&mut stdout, &e.to_string())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(book: &mut ScenarioBook, cmd: IpcCommand) -> Result<()> {
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => {}
        IpcCommand::AddScenario { name } => {
            book.add(name.as_deref())?;
        }
        IpcCommand::SetField { scenario_id, field, value } => {
            let field: InputField = field.parse()?;
            book.set_field(&scenario_id, field, value)?;
        }
        IpcCommand::ReplaceInputs { scenario_id, inputs } => {
            book.replace_inputs(&scenario_id, inputs)?;
        }
        IpcCommand::Rename { scenario_id, name } => {
            book.rename(&scenario_id, &name)?;
        }
        IpcCommand::Reset { scenario_id } => {
            book.reset(&scenario_id)?;
        }
        IpcCommand::Remove { scenario_id } => {
            book.remove(&scenario_id)?;
        }
    }
    Ok(())
}

fn build_ui_state(book: &ScenarioBook) -> UiState<'_> {
    UiState {
        active_template: &book.config().active_template,
        scenarios: book.iter().collect(),
    }
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{}", err_json)?;
    out.flush()?;
    Ok(())
}

fn write_summary(out: &mut impl Write, scenario: &Scenario, template: &str) -> io::Result<()> {
    let m = &scenario.metrics;
    let r = &m.ratios;

    writeln!(out, "=== {} [{template}] ===", scenario.name)?;
    if !scenario.is_current() {
        writeln!(out, "  (invalid inputs: {})", scenario.validation)?;
    }

    writeln!(out, "  -- Funnel --")?;
    for stage in &m.stages {
        match stage.conversion_from_previous {
            Some(rate) => writeln!(
                out,
                "  {:<16} {:>10.2}  ({rate:.1}%)",
                stage.label, stage.volume
            )?,
            None => writeln!(out, "  {:<16} {:>10.2}", stage.label, stage.volume)?,
        }
    }
    writeln!(out, "  revenue:        ${:.2}", m.estimated_revenue)?;
    writeln!(out, "  roas:           {:.2}x", m.roas)?;

    writeln!(out, "  -- Goal: {} clients --", scenario.inputs.target_new_clients)?;
    writeln!(out, "  clicks needed:  {}", fmt_requirement(m.est_clicks))?;
    writeln!(out, "  leads needed:   {}", fmt_requirement(m.est_leads))?;
    if let Some(req) = m.est_discovery_calls {
        writeln!(out, "  discovery:      {}", fmt_requirement(req))?;
    }
    if let Some(req) = m.est_sales_calls {
        writeln!(out, "  sales calls:    {}", fmt_requirement(req))?;
    }
    if let Some(req) = m.est_proposals {
        writeln!(out, "  proposals:      {}", fmt_requirement(req))?;
    }
    match m.required_budget {
        Some(budget) => writeln!(out, "  budget needed:  ${budget:.2}")?,
        None => writeln!(out, "  budget needed:  unreachable")?,
    }

    writeln!(out, "  -- ROI --")?;
    writeln!(out, "  monthly profit: ${:.2}", r.monthly_profit)?;
    writeln!(out, "  profit margin:  {:.1}%", r.profit_margin)?;
    writeln!(out, "  annual ROI:     {:.1}%", r.annual_roi)?;
    match r.break_even_point {
        Some(months) => writeln!(out, "  break-even:     {months:.1} months")?,
        None => writeln!(out, "  break-even:     unreachable")?,
    }
    writeln!(out, "  payback:        {:.1} months", r.payback_period)?;
    match r.cost_per_acquisition {
        Some(cpa) => writeln!(out, "  CPA:            ${cpa:.2}")?,
        None => writeln!(out, "  CPA:            n/a")?,
    }
    writeln!(
        out,
        "  daily budget:   ${:.2} ({} leads/day)",
        m.budget_plan.daily_budget, m.budget_plan.daily_leads_needed
    )?;
    writeln!(out)
}

fn fmt_requirement(req: Requirement) -> String {
    match req {
        Requirement::Count(n) => n.to_string(),
        Requirement::Unreachable => "unreachable".to_string(),
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_names_the_template_and_the_clicks_needed() {
        let mut book = ScenarioBook::new(FunnelConfig::default()).unwrap();
        let template = book.config().template().unwrap().label.clone();
        let scenario = book.add(None).unwrap();

        let mut out = Vec::new();
        write_summary(&mut out, scenario, &template).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("=== Scenario 1 [Discovery, sales call and proposal] ==="), "{text}");
        // 2 clients through four 50 % stages and a 5 % landing page.
        assert!(text.contains("clicks needed:  640"), "{text}");
        assert!(text.contains("budget needed:  $2560.00"), "{text}");
    }
}
