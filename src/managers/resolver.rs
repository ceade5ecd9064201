use crate::constants::provisioning;
use crate::errors::OpsError;
use crate::services::command_runner::CommandRunner;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::data_path::require_str;
use crate::utils::user_paths::absolutize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

/// Finds the address of the provisioned host: an operator override when
/// given, `terraform output -json` otherwise. Both paths are validated.
#[derive(Clone)]
pub struct IpResolver {
    logger: Logger,
    validation: Validation,
    runner: Arc<dyn CommandRunner>,
    terraform_dir: PathBuf,
}

impl IpResolver {
    pub fn new(
        logger: Logger,
        validation: Validation,
        runner: Arc<dyn CommandRunner>,
        terraform_dir: PathBuf,
    ) -> Self {
        Self {
            logger: logger.child("resolver"),
            validation,
            runner,
            terraform_dir,
        }
    }

    pub async fn resolve(&self, explicit: Option<&str>) -> Result<Ipv4Addr, OpsError> {
        if let Some(raw) = explicit {
            let ip = self.validation.ensure_ipv4(raw)?;
            self.logger.info(
                "Using explicit ip",
                Some(&serde_json::json!({ "ip": ip.to_string() })),
            );
            return Ok(ip);
        }
        self.from_provisioning().await
    }

    async fn from_provisioning(&self) -> Result<Ipv4Addr, OpsError> {
        let dir = absolutize(&self.terraform_dir)?;
        self.logger.info("Running Terraform command to get output...", None);
        let args = vec![
            format!("-chdir={}", dir.display()),
            "output".to_string(),
            "-json".to_string(),
        ];
        let output = self
            .runner
            .run(provisioning::PROGRAM, &args)
            .await?
            .into_success()?;

        self.logger.info("Parsing JSON output...", None);
        let ip = parse_public_ip(&output.stdout)?;
        let ip = self.validation.ensure_ipv4(&ip)?;
        self.logger.info(
            "Resolved host ip",
            Some(&serde_json::json!({ "ip": ip.to_string() })),
        );
        Ok(ip)
    }
}

/// Pulls `instance_public_ip.value` out of `terraform output -json`. The value
/// is returned unvalidated.
pub fn parse_public_ip(raw: &str) -> Result<String, OpsError> {
    let doc: serde_json::Value = serde_json::from_str(raw).map_err(|err| {
        OpsError::subprocess(format!("Failed to parse JSON: {}", err))
            .with_hint("Run `terraform apply` first so the outputs exist.")
    })?;
    Ok(require_str(&doc, provisioning::PUBLIC_IP_FIELD)?.to_string())
}
