use display_error_chain::DisplayErrorChain;
use futures::TryStreamExt;
use gemini_vertex::prelude::*;
use std::io::Write;
use std::process::ExitCode;
use tracing::info;

const SAMPLES: &str = "gs://cloud-samples-data/generative-ai";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

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
    info!(
        project = vertex.config().project_id(),
        region = vertex.config().location(),
        "session initialized"
    );

    let model = vertex.model(Model::Gemini15ProPreview0514);
    let translator = vertex.model_with_system_instruction(
        Model::Gemini15ProPreview0514,
        [
            "You are a helpful language translator.",
            "Your mission is to translate text in English to French.",
        ],
    );

    // Text with system instructions, generation parameters and safety settings
    let prompt = "\n  User input: I like bagels.\n  Answer:\n";
    let request = translator
        .generate_content()
        .with_text(prompt)
        .with_generation_config(GenerationConfig {
            temperature: Some(0.9),
            top_p: Some(1.0),
            top_k: Some(32),
            candidate_count: Some(1),
            max_output_tokens: Some(8192),
            ..Default::default()
        })
        .with_safety_settings(SafetySettings::uniform(HarmBlockThreshold::BlockLowAndAbove));

    let count = request.clone().count_tokens().await?;
    println!("{}", TokenCountReport::new(&count));

    let response = request.execute().await?;
    println!("\n{}", ResponseReport::new(&response));

    // Audio summarization
    let audio_uri = format!("{SAMPLES}/audio/pixel.mp3");
    let response = model
        .generate_content()
        .with_file_data(&audio_uri, "audio/mpeg")
        .with_text(
            "Please provide a summary for the audio.\n\
             Provide chapter titles, be concise and short, no need to provide chapter summaries.\n\
             Do not make up any information that is not part of the audio and do not be verbose.",
        )
        .execute()
        .await?;
    println!("audio summary:\n{}", response.text());

    // Audio transcription, streamed
    let mut stream = model
        .generate_content()
        .with_file_data(&audio_uri, "audio/mpeg")
        .with_text(
            "Can you transcribe this interview, in the format of timecode, speaker, caption.\n\
             Use speaker A, speaker B, etc. to identify the speakers.",
        )
        .execute_stream()
        .await?;
    while let Some(chunk) = stream.try_next().await? {
        print!("{}", chunk.text());
        std::io::stdout().flush()?;
    }
    println!();

    // Video with audio
    let response = model
        .generate_content()
        .with_file_data(format!("{SAMPLES}/video/pixel8.mp4"), "video/mp4")
        .with_text(
            "Provide a description of the video.\n\
             The description should also contain anything important which people say in the video.",
        )
        .execute()
        .await?;
    println!("video and audio description:\n{}", response.text());

    // PDF document
    let pdf = Part::from_uri_checked(format!("{SAMPLES}/pdf/2403.05530.pdf"), "application/pdf")?;
    let response = model
        .generate_content()
        .with_part(pdf.clone())
        .with_text(
            "You are a very professional document summarization specialist.\n\
             Please summarize the given document.",
        )
        .execute()
        .await?;
    println!("pdf details:\n{}", response.text());

    // PDF and image together
    let chart = Part::from_uri_guessed(format!("{SAMPLES}/image/cumulative-average.png"))?;
    let response = model
        .generate_content()
        .with_parts([pdf, chart])
        .with_text(
            "Task: Answer the following questions based on a PDF document and image file \
             provided in the context.\n\
             \n\
             Instructions:\n\
             - Look through the image and the PDF document carefully and answer the question.\n\
             - Give a short and terse answer to the following question.\n\
             - Do not paraphrase or reformat the text you see in the image.\n\
             - Cite the source of page number for the PDF document provided as context.\n\
             \n\
             Questions:\n\
             - What is in the given image?\n\
             - Is there a similar graph in the given document?",
        )
        .execute()
        .await?;
    println!("{}", response.text());

    // Video, image and text at once
    let response = model
        .generate_content()
        .with_file_data(
            format!("{SAMPLES}/video/behind_the_scenes_pixel.mp4"),
            "video/mp4",
        )
        .with_file_data(format!("{SAMPLES}/image/a-man-and-a-dog.png"), "image/png")
        .with_text(
            "Look through each frame in the video carefully and answer the questions.\n\
             Only base your answers strictly on what information is available in the video \
             attached.\n\
             Do not make up any information that is not part of the video and do not be too\n\
             verbose, be to the point.\n\
             \n\
             Questions:\n\
             - When is the moment in the image happening in the video? Provide a timestamp.\n\
             - What is the context of the moment and what does the narrator say about it?",
        )
        .execute()
        .await?;
    println!("{}", ResponseReport::new(&response));

    Ok(())
}
