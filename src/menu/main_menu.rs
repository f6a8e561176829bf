use crate::component::GenerationMode;
use crate::config::Config;
use crate::config::save::save_settings;
use crate::menu::handlers::run_contact_sheet_generator;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const ESC_HINT: &str = "（按 ESC 返回）";

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 影片預覽圖工具 ===").cyan().bold());
    println!("{}", style(ESC_HINT).dim());

    let options = vec![
        "產生影片預覽圖",
        "使用既有縮圖重新合成",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_contact_sheet_generator(term, shutdown_signal, config, GenerationMode::Generate)?;
            Ok(true)
        }
        Some(1) => {
            run_contact_sheet_generator(
                term,
                shutdown_signal,
                config,
                GenerationMode::FromWorkspace,
            )?;
            Ok(true)
        }
        Some(2) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(3) | None => Ok(false), // ESC pressed - exit
        _ => unreachable!(),
    }
}

/// 預覽圖設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        let settings = &config.settings.contact_sheet;
        println!("{}", style("=== 預覽圖設定 ===").cyan().bold());
        println!("{}", style(ESC_HINT).dim());

        let output_directory = settings
            .output_directory
            .as_ref()
            .map_or_else(|| "影片所在資料夾".to_string(), |p| p.display().to_string());
        let options = vec![
            format!("縮圖最大寬度: {}", settings.max_thumbnail_width),
            format!("輸出資料夾: {output_directory}"),
            format!(
                "合成後刪除暫存縮圖: {}",
                if settings.clean_workspace { "是" } else { "否" }
            ),
            "返回".to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇設定項目")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        let changed = match selection {
            Some(0) => edit_max_thumbnail_width(config)?,
            Some(1) => edit_output_directory(config)?,
            Some(2) => edit_clean_workspace(config)?,
            Some(3) | None => break, // ESC or back
            _ => unreachable!(),
        };

        if changed {
            save_settings(&config.settings)?;
            println!("\n{}", style("設定已儲存").green());
            std::thread::sleep(std::time::Duration::from_secs(1));
        }
    }

    Ok(())
}

fn edit_max_thumbnail_width(config: &mut Config) -> Result<bool> {
    let current = config.settings.contact_sheet.max_thumbnail_width;
    let width: u32 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("縮圖最大寬度（像素）")
        .default(current)
        .validate_with(|value: &u32| {
            if *value == 0 {
                Err("寬度必須大於 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.settings.contact_sheet.max_thumbnail_width = width;
    Ok(width != current)
}

fn edit_output_directory(config: &mut Config) -> Result<bool> {
    let current = config.settings.contact_sheet.output_directory.clone();
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("輸出資料夾（留空表示影片所在資料夾）")
        .allow_empty(true)
        .interact_text()?;

    let trimmed = input.trim();
    let directory = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
    config.settings.contact_sheet.output_directory = directory;
    Ok(config.settings.contact_sheet.output_directory != current)
}

fn edit_clean_workspace(config: &mut Config) -> Result<bool> {
    let current = config.settings.contact_sheet.clean_workspace;
    let clean = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("合成後刪除暫存縮圖？")
        .default(current)
        .interact()?;

    config.settings.contact_sheet.clean_workspace = clean;
    Ok(clean != current)
}
