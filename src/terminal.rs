//! Raw-mode terminal setup and teardown, and the panic hook that undoes it.

use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn setup_terminal() -> Result<Tui> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn restore_terminal(mut terminal: Tui) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

/// Installs color-eyre's report hooks with terminal cleanup in front of the
/// panic report, so a panic never leaves the shell in raw mode.
pub fn install_hooks() -> Result<()> {
    install_hooks_with(|| {
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
    })
}

fn install_hooks_with<F>(cleanup: F) -> Result<()>
where
    F: Fn() + Send + Sync + 'static,
{
    // color_eyre::install sets the panic hook itself; ours must wrap it.
    color_eyre::install()?;
    let report_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        cleanup();
        report_hook(panic_info);
    }));
    Ok(())
}
