//! A demo program showing the weather tools on their own, then inside an
//! agent answering a fixed set of questions.

#[macro_use]
extern crate tracing;

use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::Value;
use tokio::select;
use tokio::time::sleep;
use weather_agent::core::{Tool, TranscriptSource};
use weather_agent::fetch::HttpTransport;
use weather_agent::tools::WeatherTool;
use weather_agent::{ModelEnvironment, ReportRow, SessionBuilder, render_table};
use weather_agent_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

const CITIES: [&str; 3] = ["Berlin", "NY", "Paris"];

const QUESTIONS: [&str; 4] = [
    "Which city is hotter today: LA or NY?",
    "What is the temperature today in Berlin?",
    "How to win a soccer game?",
    "What is the official definition of the term weather?",
];

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tool_only().await;
    agent_only().await;
}

async fn tool_only() {
    println!("{}", "======== TOOL ONLY ========".bold());
    let tool = WeatherTool::today_maximal_temperature(HttpTransport::new());
    let schema = tool.parameter_schema();
    println!("1. Tool name:\n{}", tool.name());
    println!("2. Tool description:\n{}", tool.description());
    println!("3. Tool arguments:\n{}", pretty(&schema["properties"]));
    println!(
        "4. Tool arguments title:\n{}\n",
        schema["properties"]["cities"]["title"]
    );

    println!("{}", "Invoke the tool and print invocation result".bold());
    let records = with_spinner("🌡️  Fetching...", tool.invoke(CITIES)).await;
    match records {
        Ok(records) => {
            println!("Result:\n{}\n", pretty(&Value::Array(records)));
        }
        Err(err) => println!("{} {err}\n", "Failed:".bright_red()),
    }
}

async fn agent_only() {
    println!("{}", "======== AGENT ONLY ========".bold());
    let environment = ModelEnvironment::load();
    println!("1. Load the environment variables\n{environment}\n");
    if environment.is_sentinel() {
        println!("Model settings are unavailable, skipping the agent.");
        return;
    }

    let config = OpenAIConfigBuilder::with_api_key(environment.api_key)
        .with_base_url(environment.base_url)
        .with_project_id(environment.project_id)
        .with_model(environment.model_id)
        .with_max_tokens(400)
        .with_temperature(1.0)
        .build();
    println!("2. Model configuration\n{config:?}\n");
    let model_provider = OpenAIProvider::new(config);

    let session = SessionBuilder::with_model_provider(model_provider)
        .on_transcript(print_transcript)
        .build(HttpTransport::new());

    println!("3. Ask the questions\n");
    let mut rows = Vec::with_capacity(QUESTIONS.len());
    for question in QUESTIONS {
        let run = with_spinner("🤔 Thinking...", session.ask(question)).await;
        let answer = match run {
            Ok(run) => run.summary(),
            Err(err) => {
                error!("failed to answer {question:?}: {err}");
                format!("error:{err}")
            }
        };
        rows.push(ReportRow::new(question, answer));
        println!();
    }

    println!("4. Results\n");
    print!("{}", render_table(&rows));
}

fn print_transcript(transcript: &str, source: TranscriptSource) {
    match source {
        TranscriptSource::User => {
            println!("{}🙋 {}", BAR_CHAR.bright_green(), transcript.bold());
        }
        TranscriptSource::Assistant => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                transcript.bright_white()
            );
        }
        TranscriptSource::Tool => {
            println!("{}🔧 {}", BAR_CHAR.bright_yellow(), transcript.dimmed());
        }
    }
}

/// Drives `fut` to completion while ticking a spinner.
async fn with_spinner<F: Future>(message: &'static str, fut: F) -> F::Output {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style);
    progress_bar.set_message(message);

    let mut fut = pin!(fut);
    let output = loop {
        progress_bar.inc(1);
        select! {
            output = &mut fut => break output,
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };

    // Finish the progress bar before printing anything else.
    progress_bar.finish_and_clear();
    output
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
