//! Interactive advisory chat over stdin.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use hydrosense_core::{Labels, Language, Parameter, PotabilityResult, WaterSample};
use hydrosense_session::{SessionError, SessionOrchestrator};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// `/analyze key=value ...`: values not given keep their current setting.
    Analyze(Vec<(Parameter, f64)>),
    Clear,
    Reset,
    Lang(Language),
    Show,
    Help,
    Quit,
    Message(String),
    Empty,
}

const HELP: &str = "\
Commands:
  /analyze key=value ...   set parameters and predict (e.g. /analyze pH=6.8 tds=900)
  /clear                   clear the chat transcript
  /reset                   forget the analyzed sample
  /lang en|ja              switch reply language
  /show                    print the current sample, result and transcript
  /quit                    exit
Anything else is sent to the water expert.";

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Message(line.to_string()));
    };

    let mut words = rest.split_whitespace();
    let command = words.next().unwrap_or_default();
    match command {
        "analyze" => words
            .map(parse_assignment)
            .collect::<Result<Vec<_>, _>>()
            .map(ReplCommand::Analyze),
        "clear" => Ok(ReplCommand::Clear),
        "reset" => Ok(ReplCommand::Reset),
        "lang" => {
            let code = words.next().ok_or("usage: /lang en|ja")?;
            Language::from_str(code)
                .map(ReplCommand::Lang)
                .map_err(|e| e.to_string())
        }
        "show" => Ok(ReplCommand::Show),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command /{} (try /help)", other)),
    }
}

fn parse_assignment(word: &str) -> Result<(Parameter, f64), String> {
    let (key, value) = word
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", word))?;
    let parameter = Parameter::from_str(key).map_err(|e| e.to_string())?;
    let value = value
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Ok((parameter, value))
}

/// Run the chat loop on stdin until `/quit` or end of input.
pub async fn run(orchestrator: &SessionOrchestrator, language: Language) -> std::io::Result<()> {
    let id = orchestrator
        .create_session(Some(language))
        .map_err(std::io::Error::other)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", Labels::for_language(language).expert_chat);
    println!("{}", HELP);
    prompt();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("! {}", msg);
                prompt();
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(e) = execute(orchestrator, id, command).await {
            println!("! {}", e);
        }
        prompt();
    }
    orchestrator.delete_session(id).map_err(std::io::Error::other)?;
    Ok(())
}

async fn execute(
    orchestrator: &SessionOrchestrator,
    id: Uuid,
    command: ReplCommand,
) -> Result<(), SessionError> {
    match command {
        ReplCommand::Analyze(assignments) => {
            let mut sample = orchestrator
                .snapshot(id)
                .await?
                .sample
                .unwrap_or_default();
            for (parameter, value) in assignments {
                sample.set(parameter, value);
            }
            let labels = Labels::for_language(orchestrator.language(id).await?);
            println!("{}", labels.analyzing);
            let analysis = orchestrator.analyze(id, sample).await?;
            print_result(labels, &sample, &analysis.result);
        }
        ReplCommand::Message(message) => match orchestrator.send_message(id, &message).await {
            Ok(exchange) => println!("{}", exchange.reply.content),
            Err(SessionError::NoSample) => {
                let language = orchestrator.language(id).await?;
                println!("{}", Labels::for_language(language).analyze_first);
            }
            Err(e) => return Err(e),
        },
        ReplCommand::Clear => orchestrator.clear_chat(id).await?,
        ReplCommand::Reset => orchestrator.reset_params(id).await?,
        ReplCommand::Lang(language) => orchestrator.set_language(id, language).await?,
        ReplCommand::Show => {
            let snapshot = orchestrator.snapshot(id).await?;
            let labels = Labels::for_language(snapshot.language);
            match (&snapshot.sample, &snapshot.result) {
                (Some(sample), Some(result)) => print_result(labels, sample, result),
                _ => println!("{}", labels.analyze_first),
            }
            for turn in &snapshot.transcript {
                println!("[{}] {}", turn.role, turn.content);
            }
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit | ReplCommand::Empty => {}
    }
    Ok(())
}

fn print_result(labels: &Labels, sample: &WaterSample, result: &PotabilityResult) {
    println!("{}: {}", labels.water_params, sample.prompt_summary());
    match result {
        PotabilityResult::Predicted { potability } => {
            let (title, desc) = labels.verdict(*potability);
            println!("[{}] {}: {}", potability.label(), title, desc);
        }
        PotabilityResult::Unavailable { reason } => {
            println!("{} ({})", labels.unavailable_title, reason);
        }
    }
    let outside = sample.out_of_optimal();
    if !outside.is_empty() {
        println!("{}:", labels.optimal_ranges);
        for parameter in outside {
            if let Some(range) = parameter.optimal_range() {
                println!("  {} = {} ({})", parameter, sample.get(parameter), range);
            }
        }
    }
}

fn prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}
