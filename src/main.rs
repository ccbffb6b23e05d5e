use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use synapse::ai::SynapseAI;
use synapse::config::ChatConfig;
use synapse::document::{self, PdfiumDecoder};
use synapse::{ChatController, Conversation, ConversationEvent, DocumentIngestor, Message};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const HELP: &str = "Type a message and press Enter. Commands: /attach <file.pdf>, /history, /quit";

fn load_dotenv() {
    // A .env file is optional; variables already set in the environment win
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env loaded"),
    }
}

fn render_message(msg: &Message) {
    println!("[{} • {}] {}", msg.sender().label(), msg.timestamp(), msg.text());
}

/// Prints the transcript and typing indicator as the conversation changes.
async fn render_events(conversation: Conversation) {
    let mut events = conversation.subscribe();
    loop {
        match events.recv().await {
            Ok(ConversationEvent::MessageAppended(msg)) => render_message(&msg),
            Ok(ConversationEvent::ComposingChanged(true)) => println!("AI is typing…"),
            Ok(ConversationEvent::ComposingChanged(false)) => {}
            Ok(ConversationEvent::AttachmentChanged(Some(name))) => println!("📎 {name}"),
            Ok(ConversationEvent::AttachmentChanged(None)) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "renderer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn attach(ingestor: &DocumentIngestor, raw_path: &str) {
    let path = PathBuf::from(raw_path.trim());
    if !document::is_pdf(&path) {
        println!("Only PDF files can be attached.");
        return;
    }
    let ingestor = ingestor.clone();
    tokio::spawn(async move {
        if let Err(e) = ingestor.ingest_file(&path).await {
            debug!(error = %e, "ingestion finished with error");
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    load_dotenv();

    let config = ChatConfig::from_env()?;
    let generator = SynapseAI::from_config(&config)?;
    info!(
        provider = generator.provider_name(),
        model = %config.model_id,
        dummy = config.dummy_mode,
        "starting synapse"
    );

    let conversation = Conversation::new();
    let controller = ChatController::new(conversation.clone(), Arc::new(generator));
    let ingestor = DocumentIngestor::new(
        conversation.clone(),
        Arc::new(PdfiumDecoder::new(config.pdfium_library_dir.clone())),
    );

    tokio::spawn(render_events(conversation.clone()));
    println!("Synapse AI Chatbot");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/history" => {
                for msg in conversation.history() {
                    render_message(&msg);
                }
            }
            _ => {
                if let Some(path) = command.strip_prefix("/attach ") {
                    attach(&ingestor, path);
                    continue;
                }
                let text = command.to_string();
                let controller = controller.clone();
                tokio::spawn(async move {
                    if let Err(e) = controller.send(&text).await {
                        debug!(error = %e, "send finished with error");
                    }
                });
            }
        }
    }

    Ok(())
}
