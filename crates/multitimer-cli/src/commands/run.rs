use std::time::Duration;

use clap::Args;
use multitimer_core::{runtime, Event, TimerStatus};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::open_engine;

#[derive(Args)]
pub struct RunArgs {
    /// Stop after this many seconds
    #[arg(long)]
    pub for_secs: Option<u64>,
    /// Stop once no timer is running
    #[arg(long)]
    pub until_idle: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(drive(args))
}

async fn drive(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, _config) = open_engine()?;
    let cancel = CancellationToken::new();
    let (handle, task) = runtime::spawn(engine, cancel.clone());
    let mut events = handle.subscribe();

    let deadline = async {
        match args.for_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let idle = args.until_idle && !handle.has_active().await?;
    if !idle {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = &mut deadline => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        print_event(&event)?;
                        if args.until_idle
                            && stopped_running(&event)
                            && !handle.has_active().await?
                        {
                            // The rest of the final firing is already buffered.
                            while let Ok(event) = events.try_recv() {
                                print_event(&event)?;
                            }
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    cancel.cancel();
    let engine = task.await?;
    engine.flush()?;
    Ok(())
}

fn stopped_running(event: &Event) -> bool {
    matches!(
        event,
        Event::TimerUpdated { status, .. } if *status != TimerStatus::Running
    )
}

fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
