use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "jobeet", about = "Jobeet job board server and maintenance tasks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply migrations and start the HTTP server
    #[default]
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Delete unactivated jobs older than the given number of days
    Cleanup {
        #[arg(long, default_value_t = 60)]
        days: i64,
    },
    /// Approve an affiliate so its token opens the job feed
    ActivateAffiliate {
        #[arg(long)]
        id: i32,
    },
}

impl Cli {
    /// Serving is the default when no subcommand is given
    pub fn command(self) -> Command {
        self.command.unwrap_or_default()
    }
}
