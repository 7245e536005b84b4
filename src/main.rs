mod config;
mod input;

use anyhow::Result;
use cmdproc_core::{CommandProcessor, CommandReply};
use config::HostConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, sleep, Instant};

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout carries replies, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = HostConfig::from_env()?;

    info!("Command host starting");
    info!("  Default client id: {}", config.client_id);

    let processor = Arc::new(CommandProcessor::with_default_commands(
        config.processor.clone(),
    )?);
    info!(
        "Registered commands: {}",
        processor.registered_command_names().join(", ")
    );
    processor.start()?;

    // Spawn reply delivery task
    let processor_clone = processor.clone();
    let drain_interval = config.drain_interval;
    let delivery = tokio::spawn(async move {
        let mut ticker = interval(drain_interval);
        loop {
            ticker.tick().await;
            for reply in processor_clone.drain_replies() {
                print_reply(&reply);
            }
        }
    });

    // Main input loop
    // A read error still goes through the shutdown below before it is returned
    let mut input_error = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&processor, &line, config.client_id),
                    Ok(None) => {
                        debug!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        input_error = Some(e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Give queued commands a chance to finish
    let deadline = Instant::now() + config.shutdown_grace;
    while processor.pending_count() > 0 && Instant::now() < deadline {
        sleep(config.drain_interval).await;
    }
    for pending in processor.pending_commands() {
        warn!(
            client_id = pending.client_id,
            name = %pending.name,
            status = %pending.status,
            steps = pending.steps,
            "Command still queued at shutdown"
        );
    }

    delivery.abort();
    shutdown(&processor).await?;

    for reply in processor.drain_replies() {
        print_reply(&reply);
    }

    info!("Command host stopped");
    match input_error {
        Some(e) => Err(anyhow::Error::new(e).context("reading command input")),
        None => Ok(()),
    }
}

/// Stop the worker off the async runtime; `stop` blocks until the thread exits
async fn shutdown(processor: &Arc<CommandProcessor>) -> Result<()> {
    let stopper = Arc::clone(processor);
    tokio::task::spawn_blocking(move || stopper.stop()).await?;
    Ok(())
}

/// Submit one input line, reporting submission errors as a failed reply
fn handle_line(processor: &CommandProcessor, line: &str, default_client: u32) {
    let Some(request) = input::parse_line(line, default_client) else {
        return;
    };

    match processor.submit(request.client_id, request.text) {
        Ok(()) => {
            debug!(client_id = request.client_id, "Command submitted");
        }
        Err(e) => {
            warn!(client_id = request.client_id, "Command rejected: {}", e);
            print_reply(&CommandReply::fail(request.client_id, e.to_string()));
        }
    }
}

fn print_reply(reply: &CommandReply) {
    println!("{}\t{}\t{}", reply.client_id, reply.status, reply.payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdproc_core::ProcessorConfig;
    use std::time::Duration;

    fn host_processor() -> Arc<CommandProcessor> {
        Arc::new(
            CommandProcessor::with_default_commands(ProcessorConfig::default())
                .expect("default commands should register"),
        )
    }

    #[tokio::test]
    async fn test_input_line_is_executed_by_worker() {
        let processor = host_processor();
        processor.start().unwrap();

        handle_line(&processor, r#"7 <Command Name="Echo" Text="hi"/>"#, 0);

        let mut replies = Vec::new();
        for _ in 0..500 {
            replies.extend(processor.drain_replies());
            if !replies.is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        shutdown(&processor).await.unwrap();

        assert_eq!(replies, vec![CommandReply::success(7, "hi")]);
        assert!(!processor.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_leaves_nothing_blocking_for_drop() {
        let processor = host_processor();
        processor.start().unwrap();

        shutdown(&processor).await.unwrap();
        assert!(!processor.is_running());
        assert_eq!(processor.state(), cmdproc_core::WorkerState::Stopped);

        // Last reference dropped on the runtime; stop has nothing left to join
        drop(processor);
    }

    #[tokio::test]
    async fn test_rejected_line_is_not_queued() {
        let processor = host_processor();

        handle_line(&processor, r#"<Command Name="Reboot"/>"#, 3);
        handle_line(&processor, "# comment", 3);

        assert_eq!(processor.pending_count(), 0);
        assert!(processor.drain_replies().is_empty());
    }
}
