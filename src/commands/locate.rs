use anyhow::{Result, anyhow};
use colored::Colorize;
use locator::{ChannelInstaller, EngineLocator, NoInstall, locate_with};

use crate::Context;
use crate::cli::LocateArgs;
use crate::config::AppConfig;
use crate::ui;

pub fn run(ctx: &Context, args: LocateArgs) -> Result<()> {
    let config = AppConfig::load(ctx.config_dir.as_deref())?;
    let install_root = args.install_root.or_else(|| config.install_root());
    let installer: Box<dyn ChannelInstaller> = if args.install {
        config.installer()
    } else {
        Box::new(NoInstall)
    };

    let mut locator = EngineLocator::with_install_root(install_root.as_deref());
    match locate_with(&mut locator, installer.as_ref()) {
        Ok(path) => {
            if ctx.quiet {
                println!("{}", path.display());
            } else {
                ui::success(&format!("Found {}", path.display().to_string().bold()));
                ui::kv("State", &locator.state().to_string());
                if let Some(root) = &install_root {
                    ui::kv("Install root", &root.display().to_string());
                }
            }
            Ok(())
        }
        Err(e) => {
            let category = e.category();
            ui::error(category.description());
            if !args.install && category.triggers_install() {
                ui::dim("Run with --install to use the install commands from config.toml");
            }
            Err(anyhow!("{e}\nhint: {}", category.advice()))
        }
    }
}
