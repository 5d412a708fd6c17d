//! Output formatting for the CLI.

use anyhow::Result;
use laneboard_core::{Client, Lane, LaneGap};
use serde::Serialize;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    Ok(match format {
        OutputFormat::Human => None,
        OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
    })
}

/// Print output in the specified format.
pub fn print<T: Serialize + HumanDisplay>(value: &T, format: OutputFormat) -> Result<()> {
    match render(value, format)? {
        Some(text) => println!("{text}"),
        None => println!("{}", value.human_display()),
    }
    Ok(())
}

/// Print clients grouped by lane with dynamic column widths.
pub fn print_board(clients: &[Client], format: OutputFormat) -> Result<()> {
    if let Some(text) = render(clients, format)? {
        println!("{text}");
        return Ok(());
    }

    if clients.is_empty() {
        println!("No clients found.");
        return Ok(());
    }

    let id_width = clients
        .iter()
        .map(|c| c.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);

    for lane in Lane::ALL {
        let in_lane: Vec<&Client> = clients.iter().filter(|c| c.status == lane).collect();
        if in_lane.is_empty() {
            continue;
        }

        println!("{} ({})", console::style(lane).bold(), in_lane.len());
        for client in in_lane {
            println!(
                "  {:>3}  {:<id_w$}  {}",
                client.priority,
                client.id,
                client.name,
                id_w = id_width
            );
        }
    }
    Ok(())
}

/// Print lanes that failed the density check.
pub fn print_gaps(gaps: &[LaneGap], format: OutputFormat) -> Result<()> {
    if let Some(text) = render(gaps, format)? {
        println!("{text}");
        return Ok(());
    }

    if gaps.is_empty() {
        println!("{}", console::style("All lanes are densely ranked.").green());
        return Ok(());
    }

    for gap in gaps {
        println!(
            "{} {}: missing {:?}, duplicated {:?}",
            console::style("✗").red(),
            gap.lane,
            gap.missing(),
            gap.duplicates()
        );
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) -> Result<()> {
    #[derive(Serialize)]
    struct Status<'a> {
        status: &'static str,
        message: &'a str,
    }

    match render(&Status { status: "ok", message }, format)? {
        Some(text) => println!("{text}"),
        None => println!("{message}"),
    }
    Ok(())
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

impl HumanDisplay for Client {
    fn human_display(&self) -> String {
        let mut lines = vec![
            format!("ID:        {}", self.id),
            format!("Name:      {}", self.name),
            format!("Status:    {}", self.status),
            format!("Priority:  {}", self.priority),
        ];

        if let Some(description) = &self.description {
            lines.push(format!("About:     {description}"));
        }

        lines.join("\n")
    }
}
