use display_error_chain::DisplayErrorChain;
use futures::TryStreamExt;
use gemini_vertex::prelude::*;
use std::io::Write;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    match do_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_chain = DisplayErrorChain::new(e.as_ref());
            tracing::error!(error.debug = ?e, error.chained = %error_chain, "execution failed");
            ExitCode::FAILURE
        }
    }
}

async fn do_main() -> Result<(), Box<dyn std::error::Error>> {
    let vertex = Vertex::from_env()?;
    let model = vertex.model(Model::Gemini15Flash);

    let audio = Part::from_uri_guessed("gs://cloud-samples-data/generative-ai/audio/pixel.mp3")?;

    info!("starting streaming transcription");
    let mut stream = model
        .generate_content()
        .with_part(audio)
        .with_text(
            "Can you transcribe this interview, in the format of timecode, speaker, caption.\n\
             Use speaker A, speaker B, etc. to identify the speakers.",
        )
        .execute_stream()
        .await?;

    let mut transcript = String::new();
    let mut last_finish_reason = None;
    let mut usage = None;
    while let Some(chunk) = stream.try_next().await? {
        let text = chunk.text();
        print!("{text}");
        std::io::stdout().flush()?;
        transcript.push_str(&text);

        if let Some(reason) = chunk.finish_reason() {
            last_finish_reason = Some(reason);
        }
        if chunk.usage_metadata.is_some() {
            usage = chunk.usage_metadata;
        }
    }
    println!();

    info!(
        chars = transcript.len(),
        finish_reason = last_finish_reason.map(|r| r.as_str()),
        "streaming transcription completed"
    );
    if let Some(usage) = usage {
        println!("\nUsage metadata:\n{usage}");
    }

    Ok(())
}
