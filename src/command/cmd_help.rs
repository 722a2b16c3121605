use super::{CommandHandler, CommandResponse};
use actix_web::{web, HttpResponse};
use async_trait::async_trait;

pub struct HelpCommand;

impl HelpCommand {
    pub fn new() -> Self {
        HelpCommand
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "显示所有可用命令的帮助信息"
    }

    async fn handle(
        &self,
        _args: &[&str],
        data: &web::Data<crate::AppState>,
        _token: &str,
    ) -> HttpResponse {
        let commands_info: Vec<String> = data
            .command_registry
            .descriptions()
            .into_iter()
            .map(|(name, description)| format!("- {}: {}", name, description))
            .collect();

        let help_text = format!("可用命令:\n{}", commands_info.join("\n"));
        HttpResponse::Ok().json(CommandResponse::ok(help_text, None))
    }
}
