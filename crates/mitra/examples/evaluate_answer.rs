//! Submits one answer to a running evaluation server and prints the result.
//!
//! Start `mitra-server` first, then run with:
//! cargo run --example evaluate_answer -- "Your answer text"

use std::io::Write;
use std::sync::Mutex;

use mitra::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let answer = std::env::args().nth(1).unwrap_or_else(|| {
        "Cooperative federalism means the Union and the States share responsibility. \
         GST Council and NITI Aayog are key examples."
            .to_string()
    });

    let config = EvaluationConfig {
        exam: "UPSC".into(),
        phase: normalize_phase("Descriptive Paper").into(),
        paper: "GS-2".into(),
        section: String::new(),
        question: "Discuss the evolution of cooperative federalism in India.".into(),
        marks: 10,
        word_limit: 150,
    };
    let request = EvaluationRequest::new(config, answer);
    request.validate()?;

    let client_config = ClientConfig::from_env()?;
    let client = EvaluationClient::new(&client_config)?;
    println!("Evaluating via {}\n", client.endpoint());

    // Echo raw text as it streams in.
    let mut printed = 0;
    let slot = Mutex::new(SessionSlot::new());
    client
        .run_session(&slot, request, |session| {
            let text = session.text();
            print!("{}", &text[printed..]);
            let _ = std::io::stdout().flush();
            printed = text.len();
        })
        .await;

    let slot = slot.lock().unwrap_or_else(|e| e.into_inner());
    let Some(session) = slot.current() else {
        return Ok(());
    };

    if let Some(error) = session.last_error() {
        eprintln!("\nEvaluation failed: {error}");
        return Ok(());
    }

    println!("\n\n--- Rendered ({} nodes) ---", session.document().len());
    for node in session.document() {
        match &node {
            DocumentNode::Heading { level, .. } => {
                println!("{} {}", "#".repeat(*level as usize), node.plain_text().to_uppercase())
            }
            DocumentNode::Paragraph { .. } => println!("{}", node.plain_text()),
            DocumentNode::List { kind, items } => {
                for (i, item) in items.iter().enumerate() {
                    let text: String = item.iter().map(InlineSpan::text).collect();
                    match kind {
                        ListKind::Ordered => println!("  {}. {}", i + 1, text),
                        ListKind::Unordered => println!("  • {}", text),
                    }
                }
            }
            DocumentNode::Rule => println!("{}", "─".repeat(40)),
            DocumentNode::Spacer => println!(),
        }
    }

    Ok(())
}
