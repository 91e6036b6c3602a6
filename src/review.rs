use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::credentials::{AnsweredPrompt, CredentialPrompt, CredentialStore, Credentials};
use crate::error::{Result, ReviewError};
use crate::prompt::PromptPreview;
use crate::session::{OutcomeKind, RequestOutcome, Session};
use crate::subtitle::{load_srt, write_translated_srt, SubtitleEntry};
use crate::table::{render_row, render_table};
use crate::translate::{build_chat_request, parse_reply, select_context, ChatClient, ChatRequest};

/// A translation request ready to be sent. Holds no borrow of the session, so
/// several can be in flight at once.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: Uuid,
    pub index: usize,
    pub generation: u64,
    request: ChatRequest,
    api_key: String,
}

impl PendingRequest {
    /// Issue the request and classify the result. Never retried.
    pub async fn send(self, client: Arc<dyn ChatClient>) -> RequestOutcome {
        let span = info_span!("translate", request_id = %self.id, row = self.index + 1);
        async move {
            let result = match client.complete(&self.request, &self.api_key).await {
                Ok(body) => OutcomeKind::Replied(parse_reply(&body)),
                Err(e) => OutcomeKind::Failed(e.to_string()),
            };
            debug!("Request finished");
            RequestOutcome {
                index: self.index,
                generation: self.generation,
                result,
            }
        }
        .instrument(span)
        .await
    }
}

/// One line typed in the interactive review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Translate the given 1-based row
    Translate(usize),
    Table,
    Prompt,
    Open(PathBuf),
    Write(PathBuf),
    Help,
    Quit,
    Unknown(String),
}

impl ReviewCommand {
    /// `None` for blank lines
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Ok(row) = line.parse::<usize>() {
            return Some(Self::Translate(row));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match (word, rest.is_empty()) {
            ("t" | "table", true) => Self::Table,
            ("p" | "prompt", true) => Self::Prompt,
            ("o" | "open", false) => Self::Open(PathBuf::from(rest)),
            ("w" | "write", false) => Self::Write(PathBuf::from(rest)),
            ("h" | "help" | "?", true) => Self::Help,
            ("q" | "quit" | "exit", true) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        };
        Some(command)
    }
}

const HELP: &str = "Commands:\n  \
    <row>       translate the given row\n  \
    t           show the table\n  \
    p           show the prompt configuration\n  \
    o <file>    open another subtitle file (discards translations)\n  \
    w <file>    write the translated subtitles\n  \
    q           quit";

/// Single spinner for the most recently clicked row
struct LoadingIndicator {
    bar: Option<ProgressBar>,
}

impl LoadingIndicator {
    fn new() -> Self {
        Self { bar: None }
    }

    fn update(&mut self, loading: Option<usize>) {
        match loading {
            Some(index) => {
                let bar = self.bar.get_or_insert_with(|| {
                    let bar = ProgressBar::new_spinner();
                    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                        bar.set_style(style);
                    }
                    bar.enable_steady_tick(Duration::from_millis(120));
                    bar
                });
                bar.set_message(format!("Translating row {}", index + 1));
            }
            None => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }

    fn println(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => println!("{}", message),
        }
    }
}

/// Owns the review session and everything a click needs
pub struct Reviewer {
    config: Config,
    prompt: PromptPreview,
    session: Session,
    credentials: Credentials,
    client: Arc<dyn ChatClient>,
}

impl Reviewer {
    pub fn new(config: Config, client: Arc<dyn ChatClient>) -> Self {
        let prompt = PromptPreview::from_file(&config.review.prompt_path);
        let credentials = Credentials::new(CredentialStore::new(&config.review.credential_path));
        Self::with_parts(config, prompt, credentials, client)
    }

    pub fn with_parts(
        config: Config,
        prompt: PromptPreview,
        credentials: Credentials,
        client: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            config,
            prompt,
            session: Session::default(),
            credentials,
            client,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn prompt(&self) -> &PromptPreview {
        &self.prompt
    }

    /// Replace the loaded entries; all translations are discarded
    pub fn load_entries(&mut self, entries: Vec<SubtitleEntry>) {
        self.session.load(entries);
    }

    pub async fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let entries = load_srt(path).await?;
        self.load_entries(entries);
        Ok(())
    }

    pub async fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_translated_srt(self.session.entries(), self.session.translations(), path).await
    }

    /// Build the request for a click on `index`. Nothing in the session changes
    /// unless this succeeds.
    pub fn prepare(&mut self, index: usize, prompt: &mut dyn CredentialPrompt) -> Result<PendingRequest> {
        let len = self.session.entries().len();
        if index >= len {
            return Err(ReviewError::InvalidIndex { row: index + 1, len });
        }

        let prompt_config = match &self.prompt {
            PromptPreview::Loaded(config) => config,
            PromptPreview::Invalid { error } => {
                return Err(ReviewError::Config(format!("Prompt configuration unavailable: {}", error)));
            }
        };

        let api_key = self.credentials.api_key(prompt)?;

        let translate = &self.config.translate;
        let context = select_context(
            self.session.entries(),
            index,
            self.session.translations(),
            translate.context_policy,
            translate.context_window,
        )
        .ok_or(ReviewError::InvalidIndex { row: index + 1, len })?;
        debug!(
            "Context for row {}: {} before, {} after ({:?})",
            index + 1,
            context.before.len(),
            context.after.len(),
            translate.context_policy
        );
        let request = build_chat_request(context, prompt_config, translate)?;

        self.session.begin(index);
        let pending = PendingRequest {
            id: Uuid::new_v4(),
            index,
            generation: self.session.generation(),
            request,
            api_key,
        };
        info!("Translating row {} (request {})", index + 1, pending.id);
        Ok(pending)
    }

    /// Apply a finished request; returns the rows that changed
    pub fn reconcile(&mut self, outcome: RequestOutcome) -> Vec<usize> {
        self.session.reconcile(outcome)
    }

    /// One click, awaited to completion
    pub async fn translate(&mut self, index: usize, prompt: &mut dyn CredentialPrompt) -> Result<Vec<usize>> {
        let pending = self.prepare(index, prompt)?;
        let outcome = pending.send(Arc::clone(&self.client)).await;
        Ok(self.reconcile(outcome))
    }

    /// Interactive review loop. Requests run concurrently with further input;
    /// their results are applied as they arrive.
    pub async fn run_interactive<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'static, RequestOutcome>> =
            FuturesUnordered::new();
        let mut indicator = LoadingIndicator::new();
        let mut awaiting_key: Option<usize> = None;

        println!("{}", render_table(&self.session));
        println!("{}", HELP);

        loop {
            tokio::select! {
                biased;

                Some(outcome) = in_flight.next(), if !in_flight.is_empty() => {
                    let written = self.reconcile(outcome);
                    indicator.update(self.session.loading());
                    for index in written {
                        if let Some(row) = render_row(&self.session, index) {
                            indicator.println(&row);
                        }
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };

                    if let Some(index) = awaiting_key.take() {
                        match self.prepare(index, &mut AnsweredPrompt(Some(line))) {
                            Ok(pending) => in_flight.push(pending.send(Arc::clone(&self.client)).boxed_local()),
                            Err(e) => indicator.println(&e.to_string()),
                        }
                        indicator.update(self.session.loading());
                        continue;
                    }

                    let Some(command) = ReviewCommand::parse(&line) else { continue };
                    match command {
                        ReviewCommand::Translate(row) => {
                            let len = self.session.entries().len();
                            if row == 0 || row > len {
                                indicator.println(&ReviewError::InvalidIndex { row, len }.to_string());
                                continue;
                            }
                            if self.prompt.config().is_some() && self.credentials.lookup().is_none() {
                                indicator.println("Enter your API key (empty to cancel):");
                                awaiting_key = Some(row - 1);
                                continue;
                            }
                            match self.prepare(row - 1, &mut AnsweredPrompt(None)) {
                                Ok(pending) => in_flight.push(pending.send(Arc::clone(&self.client)).boxed_local()),
                                Err(e) => indicator.println(&e.to_string()),
                            }
                            indicator.update(self.session.loading());
                        }
                        ReviewCommand::Table => indicator.println(&render_table(&self.session)),
                        ReviewCommand::Prompt => indicator.println(&self.prompt.render()),
                        ReviewCommand::Open(path) => match self.load_file(&path).await {
                            Ok(()) => {
                                indicator.update(None);
                                indicator.println(&render_table(&self.session));
                            }
                            Err(e) => indicator.println(&e.to_string()),
                        },
                        ReviewCommand::Write(path) => match self.export(&path).await {
                            Ok(()) => indicator.println(&format!("Wrote {}", path.display())),
                            Err(e) => indicator.println(&e.to_string()),
                        },
                        ReviewCommand::Help => indicator.println(HELP),
                        ReviewCommand::Quit => break,
                        ReviewCommand::Unknown(text) => {
                            indicator.println(&format!("Unknown command '{}'. Type h for help.", text));
                        }
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            warn!("Leaving with {} translation request(s) still in flight", in_flight.len());
        }
        indicator.update(None);
        Ok(())
    }
}
