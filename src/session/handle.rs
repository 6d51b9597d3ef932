//! Runs an `ExerciseSession` on its own task so every mutation is serialized.

use super::machine::{ExerciseSession, SessionError, SessionSnapshot, SessionState};
use crate::exercise::{Exercise, Question};
use log::debug;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub const SAMPLE_PERIOD: Duration = Duration::from_millis(100);

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Select(Box<Exercise>, Reply<Option<Exercise>>),
    Deselect(Reply<Option<Exercise>>),
    Play(Reply<Result<(), SessionError>>),
    Pause(Reply<Result<(), SessionError>>),
    Seek(f64, Reply<Result<(), SessionError>>),
    Forward(f64, Reply<Result<(), SessionError>>),
    Backward(f64, Reply<Result<(), SessionError>>),
    SubmitAnswer {
        question: usize,
        option: usize,
        reply: Reply<Result<bool, SessionError>>,
    },
    MarkTimestamp(Reply<Result<f64, SessionError>>),
    Regenerate(Reply<Result<(), SessionError>>),
    /// Sent back by the generation task spawned for `Regenerate`.
    QuestionsReady {
        exercise_id: Uuid,
        questions: Vec<Question>,
        reply: Reply<Result<(), SessionError>>,
    },
    Snapshot(Reply<SessionSnapshot>),
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Spawn the session task. It ends when the last handle is dropped.
    pub fn spawn(session: ExerciseSession) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(session, rx));
        Self { tx }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn select(&self, exercise: Exercise) -> Result<Option<Exercise>, SessionError> {
        self.request(|r| Command::Select(Box::new(exercise), r)).await
    }

    pub async fn deselect(&self) -> Result<Option<Exercise>, SessionError> {
        self.request(Command::Deselect).await
    }

    pub async fn play(&self) -> Result<(), SessionError> {
        self.request(Command::Play).await?
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(Command::Pause).await?
    }

    pub async fn seek(&self, fraction: f64) -> Result<(), SessionError> {
        self.request(|r| Command::Seek(fraction, r)).await?
    }

    pub async fn forward(&self, delta: f64) -> Result<(), SessionError> {
        self.request(|r| Command::Forward(delta, r)).await?
    }

    pub async fn backward(&self, delta: f64) -> Result<(), SessionError> {
        self.request(|r| Command::Backward(delta, r)).await?
    }

    pub async fn submit_answer(&self, question: usize, option: usize) -> Result<bool, SessionError> {
        self.request(|reply| Command::SubmitAnswer {
            question,
            option,
            reply,
        })
        .await?
    }

    pub async fn mark_timestamp(&self) -> Result<f64, SessionError> {
        self.request(Command::MarkTimestamp).await?
    }

    /// Resolves once the new questions are installed. Generation runs off the
    /// session task, so playback commands and sampling continue meanwhile.
    pub async fn regenerate_questions(&self) -> Result<(), SessionError> {
        self.request(Command::Regenerate).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }
}

fn apply(
    session: &mut ExerciseSession,
    command: Command,
    ready: &mpsc::UnboundedSender<Command>,
) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Select(exercise, reply) => {
            let _ = reply.send(session.select(*exercise));
        }
        Command::Deselect(reply) => {
            let _ = reply.send(session.deselect());
        }
        Command::Play(reply) => {
            let _ = reply.send(session.play());
        }
        Command::Pause(reply) => {
            let _ = reply.send(session.pause());
        }
        Command::Seek(fraction, reply) => {
            let _ = reply.send(session.seek(fraction));
        }
        Command::Forward(delta, reply) => {
            let _ = reply.send(session.forward(delta));
        }
        Command::Backward(delta, reply) => {
            let _ = reply.send(session.backward(delta));
        }
        Command::SubmitAnswer {
            question,
            option,
            reply,
        } => {
            let _ = reply.send(session.submit_answer(question, option));
        }
        Command::MarkTimestamp(reply) => {
            let _ = reply.send(session.mark_timestamp());
        }
        Command::Regenerate(reply) => match session.regeneration_request() {
            Ok((generator, exercise)) => {
                let ready = ready.clone();
                tokio::spawn(async move {
                    let questions = generator.generate_for(&exercise).await;
                    let _ = ready.send(Command::QuestionsReady {
                        exercise_id: exercise.id,
                        questions,
                        reply,
                    });
                });
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        },
        Command::QuestionsReady {
            exercise_id,
            questions,
            reply,
        } => {
            let _ = reply.send(session.apply_questions(exercise_id, questions));
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(session.snapshot());
        }
    }
}

async fn run(mut session: ExerciseSession, mut rx: mpsc::UnboundedReceiver<Command>) {
    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel();
    let mut sampler = tokio::time::interval(SAMPLE_PERIOD);
    sampler.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let playing = session.state() == SessionState::Playing;
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                apply(&mut session, command, &ready_tx);
                if !playing && session.state() == SessionState::Playing {
                    sampler.reset();
                }
            }
            Some(command) = ready_rx.recv() => apply(&mut session, command, &ready_tx),
            _ = sampler.tick(), if playing => session.sample(),
        }
    }

    session.deselect();
    debug!("[session] task stopped");
}
