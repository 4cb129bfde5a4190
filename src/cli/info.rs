use std::env;
use std::path::Path;

use anyhow::Result;
use cdp_adapter::config::detect_chrome_executable;
use flowguard::Config;

pub async fn cmd_info(config: &Config, config_path: &Path) -> Result<()> {
    println!("FlowGuard System Information");
    println!("============================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", option_env!("BUILD_DATE").unwrap_or("unknown"));
    println!("Git Commit: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!();

    println!("Configuration:");
    println!("- Config File: {}", config_path.display());
    println!("- Output Directory: {}", config.output_dir.display());
    println!("- Database: {}", config.database_path.display());
    println!("- Concurrency: {}", config.concurrency);
    println!("- Navigation Timeout: {}ms", config.navigation_timeout_ms);
    println!(
        "- Default Viewport: {}x{}",
        config.default_viewport.width, config.default_viewport.height
    );
    println!();

    println!("Browser:");
    println!("- Headless: {}", config.browser.headless);
    match config
        .browser
        .executable
        .clone()
        .or_else(detect_chrome_executable)
    {
        Some(path) => println!("- Executable: {}", path.display()),
        None => println!("- Executable: not found (set FLOWGUARD_CHROME)"),
    }
    println!();

    let vision = &config.vision;
    println!("Vision:");
    println!("- Enabled: {}", vision.enabled);
    println!("- Model: {}", vision.anthropic.model);
    println!("- Prompt Version: {}", vision.anthropic.prompt_version);
    let key_present = env::var(&vision.anthropic.api_key_env)
        .map(|key| !key.trim().is_empty())
        .unwrap_or(false);
    println!(
        "- API Key ({}): {}",
        vision.anthropic.api_key_env,
        if key_present { "set" } else { "missing" }
    );
    println!("- Cache TTL: {}h", vision.ttl_hours);
    println!("- Sweep Interval: {}s", vision.sweep_interval_secs);

    Ok(())
}
