//! Command handlers for the `murmur` binary

use crate::app::Murmur;
use crate::format::{format_date_time, format_duration};
use crate::session::ElapsedDisplay;
use crate::settings::{self, DataPaths};
use crate::tokio_runtime;
use anyhow::{bail, Context, Result};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

/// Print the display text in place on stderr
fn draw(display: &ElapsedDisplay) {
    eprint!("\r{}   ", display.text().unwrap_or_default());
}

pub fn record(app: &mut Murmur, name: Option<String>, max_seconds: Option<u64>) -> Result<()> {
    app.start_recording().context("Could not start recording")?;
    if !app.is_recording() {
        bail!("Recording did not start");
    }

    let display = app.recorder_display();
    eprintln!("Recording... press Enter or Ctrl-C to stop");

    tokio_runtime::block_on(async {
        let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let limit = async {
            match max_seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(limit);

        loop {
            tokio::select! {
                _ = redraw.tick() => draw(&display),
                _ = &mut ctrl_c => break,
                _ = &mut limit => break,
                line = stdin.next_line(), if stdin_open => match line {
                    Ok(Some(_)) => break,
                    // No terminal attached; rely on Ctrl-C or the time limit
                    Ok(None) | Err(_) => stdin_open = false,
                },
            }
        }
    });
    eprintln!();

    let Some(saved) = app.stop_recording() else {
        bail!("Recording failed; nothing was saved");
    };
    let saved = match name {
        Some(name) => app.rename(&saved, &name)?,
        None => saved,
    };

    println!(
        "Saved \"{}\" ({})",
        saved.name,
        format_duration(saved.duration_millis)
    );
    Ok(())
}

pub fn list(app: &Murmur) -> Result<()> {
    let list = app.library().list();
    if list.is_empty() {
        println!("No recordings");
        return Ok(());
    }

    for (index, recording) in list.newest_first().enumerate() {
        println!(
            "{:>3}  {:<24}  {}  {}",
            index + 1,
            recording.name,
            format_duration(recording.duration_millis),
            format_date_time(recording.created_at_millis)
        );
    }
    Ok(())
}

pub fn play(app: &mut Murmur, target: &str) -> Result<()> {
    let recording = app.find(target)?;
    println!(
        "{}  {}  {}",
        recording.name,
        format_duration(recording.duration_millis),
        format_date_time(recording.created_at_millis)
    );

    app.play(&recording);
    if !app.is_playing() {
        bail!("Could not play \"{}\"", recording.name);
    }

    let display = app.player_display();
    tokio_runtime::block_on(async {
        let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = redraw.tick() => {
                    if app.poll_playback() {
                        break;
                    }
                    draw(&display);
                }
                _ = &mut ctrl_c => break,
            }
        }
    });
    eprintln!();

    app.stop_playback();
    Ok(())
}

pub fn delete(app: &mut Murmur, target: &str, yes: bool) -> Result<()> {
    let recording = app.find(target)?;

    if !yes && settings::get_confirm_on_delete() {
        print!("Delete \"{}\"? [y/N] ", recording.name);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Cancelled");
            return Ok(());
        }
    }

    app.delete(&recording);
    println!("Deleted \"{}\"", recording.name);
    Ok(())
}

pub fn rename(app: &mut Murmur, target: &str, name: &str) -> Result<()> {
    let recording = app.find(target)?;
    let renamed = app.rename(&recording, name)?;
    println!("Renamed \"{}\" to \"{}\"", recording.name, renamed.name);
    Ok(())
}

pub fn config(
    confirm_on_delete: Option<bool>,
    microphone: Option<bool>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(confirm) = confirm_on_delete {
        settings::set_confirm_on_delete(confirm);
    }
    if let Some(enabled) = microphone {
        settings::set_microphone_enabled(enabled);
    }
    if let Some(dir) = data_dir {
        info!("Setting data directory to {:?}", dir);
        settings::set_data_dir(&dir);
    }

    let paths = DataPaths::resolve(None);
    println!("confirm-on-delete   {}", settings::get_confirm_on_delete());
    println!("microphone-enabled  {}", settings::get_microphone_enabled());
    println!("records             {}", paths.records_dir.display());
    println!("metadata            {}", paths.metadata_file.display());
    Ok(())
}
