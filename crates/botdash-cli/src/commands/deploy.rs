use super::{client, explain, list};
use crate::{notify, ui};
use anyhow::{bail, Result};
use botdash_core::models::DeployRequest;
use std::path::PathBuf;

/// Parameters for a deploy operation.
pub struct DeployParams {
    pub name: String,
    pub bot_file: PathBuf,
    /// Uploaded as an empty requirements file when absent.
    pub requirements: Option<PathBuf>,
}

fn validate(params: &DeployParams) -> Result<()> {
    if params.name.trim().is_empty() {
        bail!("Bot name must not be empty");
    }
    if !params.bot_file.is_file() {
        bail!("Bot file not found: {}", params.bot_file.display());
    }
    if let Some(req) = &params.requirements {
        if !req.is_file() {
            bail!("Requirements file not found: {}", req.display());
        }
    }
    Ok(())
}

pub async fn run(url: &str, params: DeployParams) -> Result<()> {
    validate(&params)?;
    let client = client(url)?;

    let request = DeployRequest {
        name: params.name.trim().to_string(),
        bot_file: params.bot_file,
        requirements: params.requirements,
    };

    let pb = ui::spinner(&format!("Deploying '{}'...", request.name));
    let result = client.deploy_bot(&request).await;
    pb.finish_and_clear();

    match result {
        Ok(created) => {
            notify::success(&format!("Bot deployed successfully! (id {})", created.bot_id));
        }
        Err(e) => {
            notify::error(&e.to_string());
            return Err(explain(e));
        }
    }

    println!();
    list::run(url, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_checks_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let bot = dir.path().join("bot.py");
        std::fs::write(&bot, "print('hi')").unwrap();

        let ok = DeployParams {
            name: "greeter".into(),
            bot_file: bot.clone(),
            requirements: None,
        };
        assert!(validate(&ok).is_ok());

        let blank = DeployParams {
            name: "  ".into(),
            bot_file: bot.clone(),
            requirements: None,
        };
        assert!(validate(&blank).is_err());

        let missing_req = DeployParams {
            name: "greeter".into(),
            bot_file: bot,
            requirements: Some(dir.path().join("requirements.txt")),
        };
        let err = validate(&missing_req).unwrap_err().to_string();
        assert!(err.contains("Requirements file not found"));

        let missing_bot = DeployParams {
            name: "greeter".into(),
            bot_file: dir.path().join("nope.py"),
            requirements: None,
        };
        assert!(validate(&missing_bot).is_err());
    }
}
