//! The `quizcoach init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quizcoach.toml").exists() {
        println!("quizcoach.toml already exists, skipping.");
    } else {
        std::fs::write("quizcoach.toml", SAMPLE_CONFIG)?;
        println!("Created quizcoach.toml");
    }

    std::fs::create_dir_all("notes")?;
    let notes_path = Path::new("notes/example.md");
    if notes_path.exists() {
        println!("notes/example.md already exists, skipping.");
    } else {
        std::fs::write(notes_path, EXAMPLE_NOTES)?;
        println!("Created notes/example.md");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizcoach.toml with your API key (or set QUIZCOACH_GEMINI_KEY)");
    println!("  2. Run: quizcoach play --name <you> --file notes/example.md");
    println!("  3. Or try a built-in course: quizcoach courses");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizcoach configuration

default_provider = "gemini"
default_model = "gemini-2.5-flash"
quiz_temperature = 0.7
feedback_temperature = 0.8
max_tokens = 8192
language = "French"
content_char_limit = 800000
muted = false

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;

const EXAMPLE_NOTES: &str = r#"# The water cycle

Water evaporates from oceans, lakes and rivers when the sun heats it.
The vapour rises, cools and condenses into clouds. This is condensation.

When droplets in a cloud grow heavy enough they fall as precipitation:
rain, snow, sleet or hail.

Precipitation either soaks into the ground (infiltration), feeds
groundwater, or runs off into rivers that flow back to the sea.

Plants also release water vapour through their leaves. This is called
transpiration. Evaporation and transpiration together are called
evapotranspiration.
"#;
