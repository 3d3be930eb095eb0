//! Terminal front-end for a running tutor gateway
//!

use tutor_gateway::client::{HttpGateway, Locale, SendOutcome, SessionConfig, TutorSession};
use tutor_gateway::core::models::{Language, Sender};

use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;

const HELP: &str = "\
commands:
  /lang <english|swedish|italian>   switch language (starts a new conversation)
  /lesson <on|off>                  toggle lesson mode
  /goals                            list learning goals
  /goal <text>                      add a learning goal
  /done <n>                         toggle completion of goal n
  /tr <n>                           toggle the translation of message n
  /assess                           assess your proficiency
  /profile                          show your profile
  /quit                             leave
anything else is sent to the tutor";

enum Command<'a> {
    Send(&'a str),
    Language(&'a str),
    Lesson(&'a str),
    Goals,
    AddGoal(&'a str),
    ToggleGoal(&'a str),
    ToggleTranslation(&'a str),
    Assess,
    Profile,
    Help,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Command<'a> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line);
        };
        let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
        let argument = argument.trim();

        match name {
            "lang" => Command::Language(argument),
            "lesson" => Command::Lesson(argument),
            "goals" => Command::Goals,
            "goal" => Command::AddGoal(argument),
            "done" => Command::ToggleGoal(argument),
            "tr" => Command::ToggleTranslation(argument),
            "assess" => Command::Assess,
            "profile" => Command::Profile,
            "quit" | "exit" => Command::Quit,
            _ => Command::Help,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(repl())
}

async fn repl() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let gateway_url = env::var("GATEWAY_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let locale = Locale::resolve(&env::var("APP_LOCALE").unwrap_or_else(|_| "cs-CZ".to_owned()));

    let transport = HttpGateway::new(gateway_url);
    let mut session = TutorSession::new(SessionConfig {
        locale,
        ..SessionConfig::default()
    });
    let strings = locale.strings();

    println!("{}", strings.ready_to_practice);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Send("") => {}
            Command::Send(text) => {
                println!("{}", strings.tutor_thinking);
                match session.send_message(&transport, text).await {
                    Some(SendOutcome::Replied) => print_last_reply(&session),
                    Some(_) => {
                        if let Some(message) = session.messages().last() {
                            println!("tutor> {}", message.text);
                        }
                    }
                    None => {}
                }
            }
            Command::Language(name) => match name.parse::<Language>() {
                Ok(language) => {
                    session.change_language(language);
                    println!("now practicing {}", language.display_name());
                    print_goals(&session);
                }
                Err(()) => println!("unknown language: {name}"),
            },
            Command::Lesson(flag) => {
                session.set_lesson_mode(matches!(flag, "on" | "true" | "1"));
                println!("lesson mode: {}", session.config().lesson_mode);
            }
            Command::Goals => print_goals(&session),
            Command::AddGoal(text) => {
                if session.add_custom_goal(text).is_none() {
                    println!("{}", strings.enter_learning_goal);
                }
                print_goals(&session);
            }
            Command::ToggleGoal(index) => {
                match nth(index, session.goals().len()).map(|i| session.goals()[i].id) {
                    Some(id) => {
                        session.toggle_goal_completion(id);
                        print_goals(&session);
                    }
                    None => println!("no goal {index}"),
                }
            }
            Command::ToggleTranslation(index) => {
                match nth(index, session.messages().len()).map(|i| session.messages()[i].id) {
                    Some(id) => match session.toggle_message_translation(id) {
                        Some(_) => println!(
                            "{}",
                            session.displayed_text(id).unwrap_or_default()
                        ),
                        None => println!("only tutor messages have translations"),
                    },
                    None => println!("no message {index}"),
                }
            }
            Command::Assess => {
                let analysis = session.assess_proficiency(&transport).await;
                println!(
                    "level: {} (confidence {:.2})\n{}",
                    analysis.level, analysis.confidence, analysis.reasoning
                );
            }
            Command::Profile => {
                let profile = session.profile();
                println!(
                    "level: {}\nmessages: {}\nvocabulary: {} words\naccuracy: {}%",
                    profile.proficiency_level,
                    profile.total_message_count,
                    profile.vocabulary.len(),
                    profile.grammar_accuracy
                );
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

/// Parses a 1-based index below `len`.
fn nth(index: &str, len: usize) -> Option<usize> {
    index
        .parse::<usize>()
        .ok()
        .filter(|i| (1..=len).contains(i))
        .map(|i| i - 1)
}

fn print_last_reply(session: &TutorSession) {
    let Some(message) = session.messages().last() else {
        return;
    };
    debug_assert_eq!(message.sender, Sender::Tutor);

    println!("tutor> {}", message.text);
    if message.translation.is_some() && !session.config().target_language_only {
        println!(
            "       ({}: /tr {})",
            session.config().locale.strings().translation_label,
            session.messages().len()
        );
    }
    if let Some(feedback) = session.feedback() {
        for line in feedback.positive.iter().chain(&feedback.corrections).chain(&feedback.suggestions) {
            println!("  * {line}");
        }
    }
}

fn print_goals(session: &TutorSession) {
    for (i, goal) in session.goals().iter().enumerate() {
        let mark = if goal.completed { "x" } else { " " };
        println!("{:>2}. [{mark}] {} ({}%)", i + 1, goal.text, goal.progress);
    }
}
