use crate::component::{ContactSheetGenerator, GenerationMode};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use log::warn;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_contact_sheet_generator(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
    mode: GenerationMode,
) -> Result<()> {
    let generator = ContactSheetGenerator::new(config.clone(), Arc::clone(shutdown_signal));

    match generator.run(mode) {
        Ok(video_path) => {
            add_recent_path(&mut config.settings, &video_path.to_string_lossy());
            if let Err(e) = save_settings(&config.settings) {
                warn!("無法儲存最近使用路徑: {e:#}");
            }
        }
        Err(e) => eprintln!("{} {:#}", style("錯誤:").red().bold(), e),
    }

    pause(term)?;
    Ok(())
}
