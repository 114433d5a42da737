//! Commands run when a player is admitted to limbo.

use authgate_types::PlayerHandle;

/// Runs the post-join command list for a player.
///
/// Called on the main thread as the last step of admission, after every
/// protection is in place. Failures are the runner's own concern: there is
/// no error channel back to the gate.
pub trait CommandRunner: Send + 'static {
    fn run_on_join<P: PlayerHandle>(&self, player: &mut P);
}

/// A [`CommandRunner`] that runs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommands;

impl CommandRunner for NoCommands {
    fn run_on_join<P: PlayerHandle>(&self, _player: &mut P) {}
}

/// Runs a configured list of commands as the player.
///
/// `%p` in a command is replaced with the player's display name. A leading
/// `/` is accepted and stripped.
#[derive(Debug, Clone, Default)]
pub struct JoinCommands {
    commands: Vec<String>,
}

impl JoinCommands {
    /// Builds the runner, dropping blank entries.
    pub fn new(commands: impl IntoIterator<Item = String>) -> Self {
        let commands = commands
            .into_iter()
            .map(|c| c.trim().trim_start_matches('/').to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandRunner for JoinCommands {
    fn run_on_join<P: PlayerHandle>(&self, player: &mut P) {
        for command in &self.commands {
            let command = command.replace("%p", player.display_name());
            tracing::debug!(player = player.display_name(), %command, "running join command");
            player.perform_command(&command);
        }
    }
}
