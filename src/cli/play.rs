use std::error::Error;
use std::path::Path;

pub fn handle_play(arrangement: &str, silent: bool, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let expanded = shellexpand::tilde(arrangement);
    let path = Path::new(expanded.as_ref());
    if !path.is_file() {
        return Err(format!("Arrangement not found: {}", path.display()).into());
    }

    #[cfg(feature = "player")]
    {
        takedeck::player::app::run(path, takedeck::player::app::RunOptions { silent, seed })
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = silent;
        let _ = seed;
        use owo_colors::OwoColorize;
        println!("{} {}", "🎵".cyan(), "takedeck player".bold());
        println!();
        println!(
            "{} Playback requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, install with:");
        println!("  {}", "cargo install takedeck --features player".cyan());
        println!();
        println!("Or if building from source:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}
