use finance_advisor_chat::llm::{GeminiConfig, GeminiSessionFactory};
use finance_advisor_chat::render::NO_TRANSACTIONS_PLACEHOLDER;
use finance_advisor_chat::{
    AmountClass, ConversationController, ConversationEvent, Profile, SubmitOutcome,
    TransactionTable,
};
use futures::channel::mpsc;
use futures::StreamExt;
use std::error::Error;
use std::io::{self, Write};

fn choose_profile() -> Result<Profile, Box<dyn Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg.parse::<Profile>()?);
    }

    println!("Who are you?");
    for (i, profile) in Profile::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, profile);
    }
    loop {
        print!("profile> ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let choice = input.trim();
        let picked = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Profile::ALL.get(i).copied())
            .or_else(|| choice.parse::<Profile>().ok());
        if let Some(profile) = picked {
            return Ok(profile);
        }
    }
}

fn print_table(table: &TransactionTable) {
    match table {
        TransactionTable::Empty => println!("  ({})", NO_TRANSACTIONS_PLACEHOLDER),
        TransactionTable::Rows(rows) => {
            for row in rows {
                let marker = match row.class {
                    AmountClass::Positive => '+',
                    AmountClass::Negative => '-',
                };
                println!(
                    "  {} {:<12} {:<30} {:>14}",
                    marker, row.date, row.description, row.amount
                );
            }
        }
    }
}

fn report(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Halted => {
            println!("The advisor is not configured. Set GEMINI_API_KEY and restart.")
        }
        SubmitOutcome::Busy => println!("⏳ Still answering the previous message."),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = GeminiConfig::from_env();
    let factory = GeminiSessionFactory::new(&config);
    if !factory.is_configured() {
        eprintln!("⚠️  GEMINI_API_KEY is not set; the advisor will not be able to answer.");
    }

    let (tx, mut rx) = mpsc::unbounded();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.next().await {
            match event {
                ConversationEvent::ResponseStarted => print!("\n🤖 "),
                ConversationEvent::ResponseUpdated { chunk, .. } => print!("{}", chunk),
                ConversationEvent::ResponseCompleted { .. } => println!("\n"),
                ConversationEvent::ResponseFailed { message } => println!("\n❌ {}\n", message),
                ConversationEvent::SuggestionsOffered { prompts } => {
                    println!("Try one of these (type /1, /2 or /3):");
                    for (i, prompt) in prompts.iter().enumerate() {
                        println!("  /{} {}", i + 1, prompt);
                    }
                    println!();
                }
                ConversationEvent::TransactionsLoaded { message, .. } => {
                    println!("📎 {} (type /view to see them)", message)
                }
                ConversationEvent::AttachmentFailed { message } => println!("❌ {}", message),
                ConversationEvent::AttachmentCleared => println!("📎 Attachment removed."),
                _ => {}
            }
            let _ = io::stdout().flush();
        }
    });

    let profile = choose_profile()?;
    let mut controller = ConversationController::new(factory).with_events(tx);
    controller.select_profile(profile);

    println!("💬 Chatting as a {}. Commands: /attach <file.csv>, /detach, /view, quit", profile);
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            let path = path.trim();
            let _ = controller
                .attach_file(path, tokio::fs::read_to_string(path))
                .await;
        } else if line == "/detach" {
            controller.remove_attachment();
        } else if line == "/view" {
            print_table(&controller.view_transactions());
        } else if let Some(index) = line
            .strip_prefix('/')
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
        {
            report(&controller.choose_suggestion(index).await);
        } else {
            report(&controller.submit(line).await);
        }

        tokio::task::yield_now().await;
    }

    drop(controller);
    printer.await?;
    Ok(())
}
