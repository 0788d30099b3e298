//! Interactive flow for mutating commands.
//!
//! Collects missing fields when `-i` is passed. Values given as flags are
//! kept and never prompted for; the rest are asked for with the configured
//! defaults pre-filled.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use srvctl_core::config::InstallerConfig;
use srvctl_core::dispatch::OperationInput;
use srvctl_core::installer::params::DEFAULT_SECONDARY_HOST;
use srvctl_core::types::{CommandKind, ServerType};

/// Defaults offered by the prompts for one server type.
#[derive(Debug, Clone, Default)]
pub struct PromptDefaults {
    pub service_port: Option<String>,
    pub run_user: Option<String>,
    pub install_root: Option<String>,
    pub ajp_address: Option<String>,
    pub jvm_route: Option<String>,
    pub secondary_host: Option<String>,
    pub secondary_port: Option<String>,
    /// Latest locally installed engine, offered by `modify`.
    pub engine_version: Option<String>,
}

impl PromptDefaults {
    pub fn from_config(
        config: &InstallerConfig,
        server_type: ServerType,
        engine_version: Option<String>,
    ) -> Self {
        let defaults = config.defaults(server_type);
        Self {
            service_port: Some(defaults.service_port.clone()),
            run_user: Some(config.default_run_user(server_type).to_string()),
            install_root: Some(
                config
                    .install_root(server_type)
                    .to_string_lossy()
                    .into_owned(),
            ),
            ajp_address: Some(defaults.ajp_address.clone()),
            jvm_route: Some(defaults.jvm_route.clone()),
            secondary_host: Some(DEFAULT_SECONDARY_HOST.to_string()),
            secondary_port: Some(defaults.secondary_service_port.clone()),
            engine_version,
        }
    }
}

/// Result of the interactive flow.
#[derive(Debug, Clone)]
pub struct InteractiveResult {
    pub input: OperationInput,
    pub confirmed: bool,
}

pub struct InteractiveFlow<W: Write = io::Stdout> {
    command: CommandKind,
    server_type: ServerType,
    /// Values taken from flags
    prefilled: OperationInput,
    defaults: PromptDefaults,
    /// Skip the final confirmation
    yes: bool,
    writer: W,
    theme: ColorfulTheme,
}

impl InteractiveFlow<io::Stdout> {
    pub fn new(
        command: CommandKind,
        server_type: ServerType,
        prefilled: OperationInput,
        defaults: PromptDefaults,
        yes: bool,
    ) -> Self {
        Self::with_writer(command, server_type, prefilled, defaults, yes, io::stdout())
    }
}

impl<W: Write> InteractiveFlow<W> {
    pub fn with_writer(
        command: CommandKind,
        server_type: ServerType,
        prefilled: OperationInput,
        defaults: PromptDefaults,
        yes: bool,
        writer: W,
    ) -> Self {
        Self {
            command,
            server_type,
            prefilled,
            defaults,
            yes,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for every missing field the command uses, then show a
    /// summary and confirm.
    pub fn collect(&mut self) -> Result<InteractiveResult> {
        self.print_header()?;

        let mut input = self.prefilled.clone();
        input.server_id = self.prompt("Server ID", &input.server_id, None)?;

        match (self.command, self.server_type) {
            (CommandKind::Create, ty) => {
                let d = self.defaults.clone();
                input.service_port =
                    self.prompt("Service port", &input.service_port, d.service_port)?;
                input.run_user = self.prompt("Run user", &input.run_user, d.run_user)?;
                input.install_root =
                    self.prompt("Install root", &input.install_root, d.install_root)?;
                match ty {
                    ServerType::Was => {
                        input.ajp_address =
                            self.prompt("AJP address", &input.ajp_address, d.ajp_address)?;
                        input.jvm_route = self.prompt("JVM route", &input.jvm_route, d.jvm_route)?;
                    }
                    ServerType::Session => {
                        input.secondary_host =
                            self.prompt("Secondary host", &input.secondary_host, d.secondary_host)?;
                        input.secondary_port =
                            self.prompt("Secondary port", &input.secondary_port, d.secondary_port)?;
                    }
                    ServerType::Web => {}
                }
            }
            (CommandKind::Clone, _) => {
                input.clone_id = self.prompt("Clone server ID", &input.clone_id, None)?;
                input.clone_port = self.prompt("Clone service port", &input.clone_port, None)?;
            }
            (CommandKind::Modify | CommandKind::ModifyEngine, _) => {
                let default = self.defaults.engine_version.clone();
                input.version = self.prompt("Engine version", &input.version, default)?;
            }
            _ => {}
        }

        let confirmed = self.show_summary_and_confirm(&input)?;
        Ok(InteractiveResult { input, confirmed })
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}",
            style(format!("  srvctl {} {}", self.command, self.server_type))
                .bold()
                .cyan()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt(
        &self,
        label: &str,
        current: &Option<String>,
        default: Option<String>,
    ) -> Result<Option<String>> {
        if let Some(value) = current.as_deref().filter(|v| !v.trim().is_empty()) {
            return Ok(Some(value.to_string()));
        }

        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(label);
        if let Some(default) = default.filter(|d| !d.is_empty()) {
            input = input.default(default);
        }
        Ok(Some(input.interact_text()?))
    }

    fn show_summary_and_confirm(&mut self, input: &OperationInput) -> Result<bool> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Summary").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  Command:  {}", style(self.command).green())?;
        writeln!(self.writer, "  Type:     {}", style(self.server_type).green())?;

        for (label, value) in summary_rows(input) {
            writeln!(self.writer, "  {label:<9} {}", style(value).green())?;
        }
        writeln!(self.writer)?;

        if self.yes {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Proceed with {}?", self.command))
            .default(true)
            .interact()?;
        Ok(confirmed)
    }
}

/// Ask before deleting an instance unless `yes` is set.
pub fn confirm_delete(server_id: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Delete '{server_id}' and remove its install directory?"
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn summary_rows(input: &OperationInput) -> Vec<(&'static str, &str)> {
    [
        ("ID:", &input.server_id),
        ("Port:", &input.service_port),
        ("User:", &input.run_user),
        ("Root:", &input.install_root),
        ("Logs:", &input.log_home),
        ("DocRoot:", &input.document_root),
        ("Engine:", &input.engine_home),
        ("AJP:", &input.ajp_address),
        ("Route:", &input.jvm_route),
        ("Peer:", &input.secondary_host),
        ("PeerPort:", &input.secondary_port),
        ("Clone:", &input.clone_id),
        ("CloneP:", &input.clone_port),
        ("Version:", &input.version),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(|v| (label, v))
    })
    .collect()
}
