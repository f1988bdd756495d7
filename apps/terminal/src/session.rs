use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use client_core::{
    ControllerEvent, Navigation, ResultSummary, SessionController, SessionError, SessionPhase,
    SessionView,
};
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::broadcast,
    time::timeout,
};
use tracing::debug;

use crate::render;

const SETTLE_MARGIN: Duration = Duration::from_millis(100);

/// One line of respondent input, read against the screen it was typed on.
#[derive(Debug, PartialEq, Eq)]
enum Intent {
    Answer(i64),
    Back,
    Next,
    /// Moving forward is only offered once the shown question has an answer.
    NextBlocked,
    Save,
    Restore,
    Submit,
    Quit,
    Help,
    Unknown(String),
}

impl Intent {
    fn parse(line: &str, view: &SessionView) -> Self {
        match line.trim() {
            input @ ("1" | "2" | "3" | "4") => {
                Intent::Answer(input.parse().unwrap_or_default())
            }
            "b" | "back" => Intent::Back,
            "n" | "next" if view.can_go_next => Intent::Next,
            "n" | "next" => Intent::NextBlocked,
            "s" | "save" => Intent::Save,
            "r" | "resume" => Intent::Restore,
            "submit" => Intent::Submit,
            "q" | "quit" => Intent::Quit,
            "" | "h" | "help" => Intent::Help,
            other => Intent::Unknown(other.to_string()),
        }
    }
}

/// Interactive question loop. Returns once the questionnaire is submitted or the user quits.
pub async fn run(controller: &Arc<SessionController>, auto_advance_delay: Duration) -> Result<()> {
    let mut events = controller.subscribe_events();
    let mut lines = BufReader::new(stdin()).lines();
    println!("{}", render::HELP);

    loop {
        print_notices(&mut events);
        let view = controller.view().await;
        match &view.phase {
            SessionPhase::Completed => break,
            SessionPhase::Errored(message) => bail!("{message}"),
            _ => {}
        }
        println!("{}", render::question(&view));

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let result = match Intent::parse(&line, &view) {
            Intent::Answer(value) => match &view.question {
                Some(question) => {
                    let selected = controller.select_answer(&question.id, value).await;
                    if selected.is_ok() && !view.is_last {
                        wait_for_advance(&mut events, auto_advance_delay).await;
                    }
                    selected
                }
                None => Ok(()),
            },
            Intent::Back => controller.back().await.map(|_| ()),
            Intent::Next => controller.next().await.map(|navigation| {
                if let Navigation::Submit(outcome) = navigation {
                    debug!(?outcome, "submission evaluated");
                }
            }),
            Intent::NextBlocked => {
                println!("{}", render::ANSWER_FIRST);
                Ok(())
            }
            Intent::Save => controller.save_progress().await.map(|_| ()),
            Intent::Restore => controller.restore_remote_progress().await.map(|_| ()),
            Intent::Submit => controller.submit().await.map(|_| ()),
            Intent::Quit => {
                println!("answers are kept locally; run `questionnaire run` to continue");
                return Ok(());
            }
            Intent::Help => {
                println!("{}", render::HELP);
                Ok(())
            }
            Intent::Unknown(other) => {
                println!("unrecognised input '{other}'");
                Ok(())
            }
        };
        report(result)?;
    }

    print_notices(&mut events);
    match controller.results().get() {
        Some(payload) => println!("{}", render::results(&ResultSummary::from_payload(&payload))),
        None => println!("No results found"),
    }
    Ok(())
}

/// Prints recoverable failures and stops on the ones the session cannot continue after.
fn report(result: Result<(), SessionError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err @ (SessionError::InvalidAnswer(_) | SessionError::UnknownQuestion(_))) => {
            println!("{err}");
            Ok(())
        }
        // Service failures are reported through controller events.
        Err(SessionError::Service(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn wait_for_advance(
    events: &mut broadcast::Receiver<ControllerEvent>,
    auto_advance_delay: Duration,
) {
    let advanced = timeout(auto_advance_delay + SETTLE_MARGIN, async {
        while let Ok(event) = events.recv().await {
            if let Some(notice) = render::notice(&event) {
                println!("{notice}");
            }
            if matches!(event, ControllerEvent::IndexChanged { .. }) {
                return;
            }
        }
    })
    .await;
    if advanced.is_err() {
        debug!("auto-advance did not fire before the prompt");
    }
}

fn print_notices(events: &mut broadcast::Receiver<ControllerEvent>) {
    while let Ok(event) = events.try_recv() {
        if let Some(notice) = render::notice(&event) {
            println!("{notice}");
        }
    }
}
