//! A console host for the calendar skill: dialogs are printed, prompts are answered on stdin.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use calendar_skill::backend::BackendState;
use calendar_skill::config::CalendarConfig;
use calendar_skill::datetime::resolve_day;
use calendar_skill::dialog::{self, DialogData};
use calendar_skill::settings::JsonSettings;
use calendar_skill::traits::SkillHost;
use calendar_skill::{CalendarSkill, Message};

#[derive(Parser)]
#[command(name = "calendar-skill")]
#[command(about = "Ask about your appointments, or add new ones, as you would to a voice assistant")]
struct Cli {
    /// JSON file that holds the skill settings (server_type, server_address, username...)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// "What's on my calendar tomorrow?"
    Day {
        utterance: Vec<String>,
    },
    /// "How many appointments do I have on friday?"
    Count {
        utterance: Vec<String>,
    },
    /// "What is my next appointment?"
    Next,
    /// "Add an appointment tomorrow at 3pm"
    Add {
        /// Name of the appointment. Asked for when missing
        #[arg(short, long)]
        event: Option<String>,

        utterance: Vec<String>,
    },
    /// Print the raw events of a day
    List {
        utterance: Vec<String>,
    },
}

struct ConsoleHost;

impl SkillHost for ConsoleHost {
    fn speak_dialog(&self, key: &str, data: &DialogData) {
        println!("{}", dialog::render(key, data));
    }

    fn get_response(&self, key: &str, data: &DialogData) -> Option<String> {
        print!("{} ", dialog::render(key, data));
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) if line.trim().is_empty() => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                log::error!("Unable to read the answer: {}", err);
                None
            },
        }
    }
}


#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        None => JsonSettings::default(),
        Some(path) => match JsonSettings::from_file(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            },
        },
    };

    let skill = CalendarSkill::new(ConsoleHost, settings);
    match cli.command {
        Commands::Day { utterance } => skill.handle_day_appointment(&Message::new(utterance.join(" "))).await,
        Commands::Count { utterance } => skill.handle_num_appointments(&Message::new(utterance.join(" "))).await,
        Commands::Next => skill.handle_next_appointment(&Message::new("what is my next appointment")).await,
        Commands::Add { event, utterance } => {
            let mut message = Message::new(utterance.join(" "));
            message.event = event;
            skill.handle_add_appointment(&message).await
        },
        Commands::List { utterance } => list_events(skill.settings(), &utterance.join(" ")).await,
    }
}

async fn list_events(settings: &JsonSettings, utterance: &str) {
    let config = CalendarConfig::load(settings);
    let state = BackendState::select(&config);
    let mut store = match state.open() {
        Ok(Some(store)) => store,
        Ok(None) => {
            println!("{}", dialog::render(dialog::SETUP, &DialogData::new()));
            return;
        },
        Err(err) => {
            log::error!("Unable to open the calendar: {}", err);
            return;
        },
    };

    let day = resolve_day(utterance, chrono::Local::now().naive_local());
    match store.events_on(day).await {
        Ok(events) => {
            println!("{}:", day);
            calendar_skill::utils::print_event_list(&events);
        },
        Err(err) => log::error!("Unable to list the events of {}: {}", day, err),
    }
}
