/*
 * This file is part of smctemp.
 *
 * Copyright (C) 2025 smctemp contributors
 *
 * smctemp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smctemp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smctemp. If not, see <https://www.gnu.org/licenses/>.
 */

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use serde_json::json;

use smctemp::display::{format_listing, format_reading, format_temp, hex_bytes, render_value};
use smctemp::gateway::PlatformGateway;
use smctemp::{logger, ReadingReport, SmcError, SmcSession, SmcTemp};

#[derive(Parser, Debug)]
#[command(name = "smctemp")]
#[command(version)]
#[command(about = "Read CPU temperature sensors from the System Management Controller")]
struct Cli {
    /// List every key the controller exposes
    #[arg(short, long, conflicts_with_all = ["cpu", "all"])]
    list: bool,

    /// Print the CPU temperature (default)
    #[arg(short, long)]
    cpu: bool,

    /// Print every known CPU/GPU temperature sensor
    #[arg(short, long, conflicts_with = "cpu")]
    all: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Append a JSON event log (default location: the temp directory)
    #[arg(long)]
    logging: bool,

    /// Event log file; implies --logging
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    CpuTemp,
    AllCpuTemps,
}

impl Cli {
    fn operation(&self) -> Operation {
        if self.list {
            Operation::List
        } else if self.all {
            Operation::AllCpuTemps
        } else {
            Operation::CpuTemp
        }
    }
}

#[derive(Serialize)]
struct ListingRow {
    index: u32,
    key: String,
    data_type: Option<String>,
    value: Option<String>,
    bytes: Option<String>,
    error: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.logging || cli.log_file.is_some() {
        let path = cli.log_file.clone().unwrap_or_else(logger::default_log_path);
        if let Err(e) = logger::init_logging(&path) {
            eprintln!("warning: cannot open log file {}: {}", path.display(), e);
        }
        logger::log_event("startup", json!({ "args": std::env::args().collect::<Vec<_>>() }));
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            logger::log_event("fatal_error", json!({ "error": format!("{:#}", err) }));
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// 1: driver unreachable, 2: no readable sensor, 3: anything else
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SmcError>() {
        Some(e) if e.is_gateway_unavailable() => 1,
        Some(SmcError::NoReadableSensor) => 2,
        _ => 3,
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let session = SmcSession::connect(PlatformGateway::default())?;
    let mut temps = SmcTemp::new(session);

    match cli.operation() {
        Operation::List => {
            let rows = temps.session_mut().list_keys()?;
            if cli.json {
                let out: Vec<ListingRow> = rows
                    .iter()
                    .map(|r| match &r.value {
                        Ok(val) => ListingRow {
                            index: r.index,
                            key: r.key.to_string(),
                            data_type: Some(val.info.data_type.to_string()),
                            value: Some(render_value(val)),
                            bytes: Some(hex_bytes(val.data())),
                            error: None,
                        },
                        Err(e) => ListingRow {
                            index: r.index,
                            key: r.key.to_string(),
                            data_type: None,
                            value: None,
                            bytes: None,
                            error: Some(e.to_string()),
                        },
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Total keys: {}", rows.len());
                for row in &rows {
                    println!("{}", format_listing(row));
                }
            }
        }
        Operation::CpuTemp => {
            let celsius = temps.cpu_temp()?;
            if cli.json {
                println!("{}", json!({ "cpu_celsius": celsius }));
            } else {
                println!("{}", format_temp(celsius));
            }
        }
        Operation::AllCpuTemps => {
            let readings = temps.all_cpu_temps();
            if cli.json {
                let out: Vec<ReadingReport> = readings.iter().map(ReadingReport::from).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for r in &readings {
                    println!("{}", format_reading(r));
                }
            }
            if !readings.iter().any(|r| r.value.is_ok()) {
                return Err(SmcError::NoReadableSensor.into());
            }
        }
    }

    temps.session_mut().close()?;
    Ok(())
}
