//! Line-oriented front-end over the study services.

use std::io::Write;

use services::{AppServices, Notice, NoticeLevel, Notifier, StudySession};
use study_core::model::{StudyTarget, SubjectOption};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Prints notices inline with the console output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }
}

const HELP: &str = "\
Commands:
  subjects                        list subjects
  add <weight 1-5> <name>         add a subject
  timer <minutes> [subject]       run a countdown (type `stop` to cancel)
  review <subject> | <topic>      schedule a review for tomorrow
  reviews                         list reviews
  due                             list reviews due today
  save                            write both tables to the remote repository
  quit";

pub struct Console {
    services: AppServices,
    session: StudySession,
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub async fn open(services: AppServices) -> Self {
        let session = services.open_session().await;
        Self {
            services,
            session,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(mut self) -> std::io::Result<()> {
        if !self.services.is_connected() {
            println!("Running without remote storage; nothing can be saved this session.");
        }
        println!("{HELP}");

        loop {
            prompt();
            let Some(line) = self.lines.next_line().await? else {
                return Ok(());
            };
            let line = line.trim();
            let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
            let rest = rest.trim();

            match cmd {
                "" => {}
                "help" => println!("{HELP}"),
                "quit" | "exit" => return Ok(()),
                "subjects" => self.print_subjects(),
                "add" => self.add_subject(rest),
                "timer" => self.run_timer(rest).await?,
                "review" => self.add_review(rest),
                "reviews" => self.print_reviews(),
                "due" => {
                    for r in self.services.reviews().due_today(&self.session) {
                        println!("  {} {} ({})", r.subject, r.topic, r.next_review_date);
                    }
                }
                "save" => {
                    if let Err(err) = self.services.persistence().save_all(&self.session).await {
                        tracing::debug!(error = %err, "save rejected");
                    }
                }
                other => println!("unknown command: {other} (try `help`)"),
            }
        }
    }

    fn print_subjects(&self) {
        let Some(subjects) = self.session.subjects() else {
            println!("Subjects were not loaded.");
            return;
        };
        if subjects.is_empty() {
            println!("No subjects yet.");
        }
        for s in subjects.iter() {
            println!(
                "  {:<24} weight {}  {:.2} h",
                s.name().as_str(),
                s.weight().value(),
                s.studied_hours()
            );
        }
    }

    fn print_reviews(&self) {
        let Some(reviews) = self.session.reviews() else {
            println!("Reviews were not loaded.");
            return;
        };
        for r in reviews.records() {
            println!("  {}  {:<16} {:<32} next {}", r.date, r.subject, r.topic, r.next_review_date);
        }
    }

    fn add_subject(&mut self, args: &str) {
        let (weight, name) = args.split_once(' ').unwrap_or((args, ""));
        let Ok(weight) = weight.parse::<i64>() else {
            println!("usage: add <weight 1-5> <name>");
            return;
        };
        if let Err(err) = self
            .services
            .study_cycle()
            .add_subject(&mut self.session, name.trim(), weight)
        {
            println!("{err}");
        }
    }

    fn add_review(&mut self, args: &str) {
        let (subject, topic) = args.split_once('|').unwrap_or((args, ""));
        let Some(target) = choose(&self.session.subject_options(), subject.trim()) else {
            return;
        };
        if let Err(err) =
            self.services
                .reviews()
                .schedule_for(&mut self.session, &target, topic.trim())
        {
            println!("{err}");
        }
    }

    async fn run_timer(&mut self, args: &str) -> std::io::Result<()> {
        let (minutes, subject) = args.split_once(' ').unwrap_or((args, ""));
        let minutes = if minutes.is_empty() {
            25
        } else if let Ok(m) = minutes.parse::<u32>() {
            m
        } else {
            println!("usage: timer <minutes> [subject]");
            return Ok(());
        };

        let Self {
            services,
            session,
            lines,
        } = self;
        let Some(target) = choose(&session.subject_options(), subject.trim()) else {
            return Ok(());
        };
        let timer = services.timer();
        let handle = match timer.start(session, minutes, target) {
            Ok(handle) => handle,
            Err(err) => {
                println!("{err}");
                return Ok(());
            }
        };
        println!("Studying {} for {minutes} min.", handle.target().label());

        let mut updates = handle.subscribe();
        let join = handle.join();
        tokio::pin!(join);

        loop {
            tokio::select! {
                biased;
                outcome = &mut join => {
                    println!();
                    match outcome {
                        Ok(outcome) => {
                            if let Err(err) = timer.settle(session, &outcome) {
                                println!("{err}");
                            }
                        }
                        Err(err) => println!("{err}"),
                    }
                    return Ok(());
                }
                changed = updates.changed() => {
                    if changed.is_ok() {
                        print!("\r  {}  ", updates.borrow_and_update().display());
                        std::io::stdout().flush()?;
                    }
                }
                line = lines.next_line() => {
                    match line? {
                        Some(l) if l.trim() == "stop" => {
                            let _ = timer.stop(session);
                        }
                        Some(_) => println!("\ntimer running; type `stop` to cancel"),
                        None => {
                            let _ = timer.stop(session);
                        }
                    }
                }
            }
        }
    }
}

/// Resolve a typed subject name against the picker. Nothing typed picks
/// the first entry; a name that is not offered picks nothing.
fn pick(options: &[SubjectOption], typed: &str) -> Option<StudyTarget> {
    let option = if typed.is_empty() {
        options.first()
    } else {
        options.iter().find(|o| o.label == typed)
    };
    option.map(|o| o.target.clone())
}

fn choose(options: &[SubjectOption], typed: &str) -> Option<StudyTarget> {
    let target = pick(options, typed);
    if target.is_none() {
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        println!("unknown subject: {typed} (choose one of: {})", labels.join(", "));
    }
    target
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
