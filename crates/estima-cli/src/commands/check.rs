//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use estima_domain::{ChatMessage, ChatProvider, EmbeddingProvider};
use estima_llm::Provider;
use estima_store::{VectorIndex, INDEX_FILE};
use std::sync::Arc;

use super::resolve_provider;

/// Execute the check command.
///
/// The configuration has already been validated when it was loaded; this
/// reports the resolved settings and, with `--ping`, talks to the provider.
pub async fn execute_check(args: CheckArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.config_summary(config));
    println!();

    let provider = resolve_provider(&config.provider).await?;
    println!("{}", formatter.success("Configuration is valid"));

    let location = config.index.persist_dir.join(INDEX_FILE);
    if location.exists() {
        let index = VectorIndex::open(config.index.clone(), Arc::clone(&provider))?;
        match index.manifest()? {
            Some(manifest) => println!("{}", formatter.manifest(&manifest, index.location())),
            None => println!(
                "{}",
                formatter.info(&format!("Index at {} is empty", location.display()))
            ),
        }
    } else {
        println!(
            "{}",
            formatter.info(&format!("No index yet at {}", location.display()))
        );
    }

    if args.ping {
        let (dimension, reply) = tokio::task::spawn_blocking(move || ping(&provider)).await??;
        println!(
            "{}",
            formatter.success(&format!("Embeddings reachable ({} dimensions)", dimension))
        );
        println!(
            "{}",
            formatter.success(&format!("Chat model replied: {}", reply.trim()))
        );
    }

    Ok(())
}

fn ping(provider: &Provider) -> std::result::Result<(usize, String), estima_llm::LlmError> {
    let vector = provider.embed_query("ping")?;
    let reply = provider.chat(&[ChatMessage::user("Reply with the single word OK.")])?;
    Ok((vector.len(), reply))
}
