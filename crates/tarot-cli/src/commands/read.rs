use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use tarot_core::{Locale, Message, SpreadKind};
use tarot_gemini::{GeminiConfig, GeminiProvider};
use tarot_reading::{
    EngineProvider, MockEngine, MockProvider, Narrative, ReadingConfig, ReadingError,
    ReadingMachine, ReadingSession, Screen, Step, download_filename, export_summary,
};

use super::svg::SvgRenderer;

/// Environment variable consulted before prompting for a key.
const API_KEY_VAR: &str = "GEMINI_API_KEY";

pub struct ReadOptions {
    pub locale: Locale,
    pub seed: Option<u64>,
    pub timeout: u64,
    pub offline: bool,
    pub out_dir: PathBuf,
}

/// What the user asked for at the current screen.
enum Action {
    Credential(String),
    Spread(SpreadKind),
    Question(String),
    Numbers(Vec<String>),
    Back,
    Wait,
    Retry,
    NewReading,
    ExportCard,
    SaveTranscript,
    SwitchLocale(Locale),
    Stay,
    Quit,
}

pub fn run(options: ReadOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    let stdin = io::stdin();
    runtime.block_on(interact(options, stdin.lock()))
}

async fn interact<R: BufRead>(options: ReadOptions, input: R) -> Result<(), String> {
    let timeout = Duration::from_secs(options.timeout.max(1));
    let provider: Arc<dyn EngineProvider> = if options.offline {
        tracing::info!("using the offline engine");
        Arc::new(MockProvider::new(MockEngine::new().without_call_log()))
    } else {
        Arc::new(GeminiProvider::new(
            GeminiConfig::default().with_timeout(timeout),
        ))
    };

    let mut config = ReadingConfig::default()
        .with_locale(options.locale)
        .with_call_timeout(timeout);
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    let mut machine = ReadingMachine::new(provider, config);

    let locale = machine.locale();
    println!("  {}", Message::AppTitle.render(locale).bold().magenta());
    println!("  {}", Message::AppSubtitle.render(locale));
    if options.offline {
        println!("  {}", "(offline engine)".dimmed());
    }
    println!("  {}", "Commands: :back  :lang en|zh-TW  :quit".dimmed());

    let mut prompter = Prompter {
        input,
        env_key: std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty()),
        last_notice: None,
        shown: None,
    };

    loop {
        let action = prompter.next_action(&machine)?;
        let outcome: Result<(), ReadingError> = match action {
            Action::Quit => break,
            Action::Stay => Ok(()),
            Action::Wait => {
                if machine.process_next().await.is_none() {
                    return Err("engine results channel closed".into());
                }
                machine.process_ready();
                Ok(())
            }
            Action::Credential(key) => machine.submit_credential(&key),
            Action::Spread(kind) => machine.select_spread(kind),
            Action::Question(text) => machine.submit_question(&text),
            Action::Numbers(numbers) => machine.submit_numbers(numbers.as_slice()),
            Action::Back => machine.go_back(),
            Action::Retry | Action::NewReading => {
                prompter.shown = None;
                machine.start_new_reading()
            }
            Action::SwitchLocale(locale) => {
                machine.set_locale(locale);
                prompter.shown = None;
                Ok(())
            }
            Action::ExportCard => {
                export_card(&machine, &options.out_dir);
                Ok(())
            }
            Action::SaveTranscript => {
                save_transcript(&machine, &options.out_dir);
                Ok(())
            }
        };

        if let Err(err) = outcome {
            if !matches!(err, ReadingError::Validation(_)) {
                tracing::warn!(error = %err, "action rejected");
            }
            println!("  {}", err.message().render(machine.locale()).yellow());
        }
    }

    Ok(())
}

struct Prompter<R> {
    input: R,
    env_key: Option<String>,
    last_notice: Option<Message>,
    /// Generation of the reading last printed in full.
    shown: Option<u64>,
}

impl<R: BufRead> Prompter<R> {
    /// Read one line. `None` on end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, String> {
        print!("{prompt}");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) => Err(e.to_string()),
        }
    }

    fn next_action(&mut self, machine: &ReadingMachine) -> Result<Action, String> {
        let locale = machine.locale();
        let screen = machine.screen();
        if !matches!(screen, Screen::Loading { .. } | Screen::ErrorBanner { .. }) {
            self.last_notice = None;
        }

        match screen {
            Screen::Credential { error } => {
                if let Some(key) = self.env_key.take() {
                    tracing::debug!("using key from {API_KEY_VAR}");
                    return Ok(Action::Credential(key));
                }
                println!("\n  {}", Message::CredentialTitle.render(locale).bold());
                if let Some(error) = error {
                    println!("  {}", error.render(locale).red());
                }
                println!("  {}", Message::CredentialInstruction.render(locale).dimmed());
                let Some(line) = self.read_line("key> ")? else {
                    return Ok(Action::Quit);
                };
                Ok(command(&line).unwrap_or(Action::Credential(line)))
            }

            Screen::ErrorBanner { message, .. } => {
                let generating = machine.step() == Step::GeneratingReading;
                if !(generating && self.last_notice.as_ref() == Some(&message)) {
                    println!("\n  {}", Message::ErrorOccurred.render(locale).red().bold());
                    println!("  {}", message.render(locale).red());
                }
                if generating {
                    // Let the remaining images settle so the reading can be shown.
                    self.last_notice = Some(message);
                    return Ok(Action::Wait);
                }
                // A degraded reading stays on screen under the banner.
                let degraded = machine
                    .session()
                    .filter(|_| machine.step() == Step::ViewingReading);
                if let Some(session) = degraded {
                    if self.shown != Some(session.generation()) {
                        print_reading(session, locale, machine.progress().images_pending);
                        self.shown = Some(session.generation());
                    }
                    return self.reading_menu(locale, Message::TryAgain, Action::Retry);
                }
                let prompt = format!("[Enter] {} > ", Message::TryAgain.render(locale));
                let Some(line) = self.read_line(&prompt)? else {
                    return Ok(Action::Quit);
                };
                Ok(command(&line).unwrap_or(Action::Retry))
            }

            Screen::SpreadSelection => {
                println!("\n  {}", Message::SelectSpreadTitle.render(locale).bold());
                let definitions = machine.catalog().definitions();
                for (i, def) in definitions.iter().enumerate() {
                    println!(
                        "  {}. {} ({})  {}",
                        i + 1,
                        def.name(locale).bold(),
                        Message::SpreadCardCount {
                            count: def.card_count()
                        }
                        .render(locale),
                        def.description(locale).dimmed()
                    );
                }
                println!("  {}", Message::TarotDisclaimer.render(locale).dimmed());
                let Some(line) = self.read_line("spread> ")? else {
                    return Ok(Action::Quit);
                };
                if let Some(action) = command(&line) {
                    return Ok(action);
                }
                let by_number = line
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| definitions.get(i))
                    .map(|def| def.kind());
                let kind = match by_number {
                    Some(kind) => Ok(kind),
                    None => SpreadKind::parse(&line),
                };
                match kind {
                    Ok(kind) => Ok(Action::Spread(kind)),
                    Err(err) => {
                        println!("  {}", err.to_string().yellow());
                        Ok(Action::Stay)
                    }
                }
            }

            Screen::Question { spread } => {
                if let Some(def) = machine.catalog().get(spread) {
                    println!("\n  {}", def.name(locale).bold());
                }
                println!("  {}", Message::QuestionTitle.render(locale).bold());
                println!(
                    "  {}  (:back {})",
                    Message::QuestionPlaceholder.render(locale).dimmed(),
                    Message::GoBack.render(locale)
                );
                let Some(line) = self.read_line("question> ")? else {
                    return Ok(Action::Quit);
                };
                Ok(command(&line).unwrap_or(Action::Question(line)))
            }

            Screen::CardSelection { required } => {
                println!("\n  {}", Message::CardNumberTitle.render(locale).bold());
                println!(
                    "  {}",
                    Message::CardNumberInstruction { count: required }.render(locale)
                );
                let mut numbers = Vec::with_capacity(required);
                for index in 1..=required {
                    let prompt = format!("{}> ", Message::CardLabel { index }.render(locale));
                    let Some(line) = self.read_line(&prompt)? else {
                        return Ok(Action::Quit);
                    };
                    if let Some(action) = command(&line) {
                        return Ok(action);
                    }
                    numbers.push(line);
                }
                Ok(Action::Numbers(numbers))
            }

            Screen::Loading { message } => {
                if self.last_notice.as_ref() != Some(&message) {
                    println!("  {}", message.render(locale).cyan());
                    self.last_notice = Some(message);
                }
                Ok(Action::Wait)
            }

            Screen::Reading {
                session,
                images_pending,
            } => {
                if self.shown != Some(session.generation()) {
                    print_reading(session, locale, images_pending);
                    self.shown = Some(session.generation());
                }
                self.reading_menu(locale, Message::NewReading, Action::NewReading)
            }
        }
    }

    fn reading_menu(
        &mut self,
        locale: Locale,
        restart_label: Message,
        restart: Action,
    ) -> Result<Action, String> {
        println!(
            "\n  [d] {}  [t] Markdown  [n] {}  [q] :quit",
            Message::DownloadSummary.render(locale),
            restart_label.render(locale)
        );
        let Some(line) = self.read_line("> ")? else {
            return Ok(Action::Quit);
        };
        if let Some(action) = command(&line) {
            return Ok(action);
        }
        Ok(match line.trim().to_lowercase().as_str() {
            "d" => Action::ExportCard,
            "t" => Action::SaveTranscript,
            "n" => restart,
            "q" => Action::Quit,
            _ => Action::Stay,
        })
    }
}

/// Commands accepted at every prompt.
fn command(line: &str) -> Option<Action> {
    let line = line.trim();
    let rest = line.strip_prefix(':')?;
    let mut parts = rest.split_whitespace();
    match parts.next()? {
        "q" | "quit" => Some(Action::Quit),
        "back" | "b" => Some(Action::Back),
        "lang" => match parts.next().and_then(Locale::parse) {
            Some(locale) => Some(Action::SwitchLocale(locale)),
            None => {
                println!("  {}", "usage: :lang en|zh-TW".yellow());
                Some(Action::Stay)
            }
        },
        _ => None,
    }
}

fn print_reading(session: &ReadingSession, locale: Locale, images_pending: bool) {
    println!("\n  {}", Message::ReadingTitle.render(locale).bold().magenta());
    println!(
        "  {} {}",
        Message::YourQuestion.render(locale).bold(),
        session.question()
    );
    println!(
        "  {} {}",
        Message::SpreadLabel.render(locale).bold(),
        session.spread_name()
    );

    println!("\n  {}", Message::DrawnCards.render(locale).bold());
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "#", "Card", "Image"]);
    for drawn in session.cards() {
        let image = match &drawn.image {
            Some(image) => image.mime_type.clone(),
            None if images_pending => Message::ImageGenerating.render(locale),
            None => Message::ImageFailed.render(locale),
        };
        table.add_row(vec![
            drawn.position.clone(),
            drawn.number.to_string(),
            drawn.card.localized_name(locale).to_string(),
            image,
        ]);
    }
    println!("{table}");

    println!("\n  {}", Message::InterpretationLabel.render(locale).bold());
    print_narrative(session.interpretation(), locale);
    println!("\n  {}", Message::OracleLabel.render(locale).bold());
    print_narrative(session.summary(), locale);
}

fn print_narrative(narrative: &Narrative, locale: Locale) {
    let text = narrative.render(locale);
    for line in text.lines() {
        if narrative.is_failed() {
            println!("  {}", line.yellow());
        } else {
            println!("  {line}");
        }
    }
}

fn export_card(machine: &ReadingMachine, out_dir: &Path) {
    let locale = machine.locale();
    let Some(session) = machine.session() else {
        println!("  {}", Message::DownloadNotReady.render(locale).yellow());
        return;
    };
    match export_summary(session, locale, &SvgRenderer, out_dir) {
        Ok(path) => println!(
            "  {}",
            Message::SummarySaved {
                path: path.display().to_string()
            }
            .render(locale)
            .green()
        ),
        Err(err) => {
            tracing::warn!(error = %err, "summary card export failed");
            println!("  {}", err.message().render(locale).yellow());
        }
    }
}

fn save_transcript(machine: &ReadingMachine, out_dir: &Path) {
    let locale = machine.locale();
    let Some(session) = machine.session() else {
        println!("  {}", Message::DownloadNotReady.render(locale).yellow());
        return;
    };
    let name = download_filename(
        session.question(),
        chrono::Utc::now().timestamp_millis(),
        "md",
    );
    let path = out_dir.join(name);
    let written = std::fs::create_dir_all(out_dir)
        .and_then(|_| std::fs::write(&path, session.to_markdown(locale)));
    match written {
        Ok(()) => println!("  {} {}", "Saved".green().bold(), path.display()),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "transcript write failed");
            println!("  {}", Message::DownloadFailed.render(locale).yellow());
        }
    }
}
