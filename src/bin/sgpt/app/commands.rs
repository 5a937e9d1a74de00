use std::path::Path;

use anyhow::Context;

use sgpt::functions::FunctionRegistry;
use sgpt::platform::PlatformContext;
use sgpt::render::Printer;
use sgpt::repl::LineSource;
use sgpt::role::{Role, RoleStore};
use sgpt::session::{ChatSessionStore, SessionKey};
use sgpt::SgptError;

use crate::args::CliArgs;
use crate::integration;

use super::editor;
use super::input::TerminalInput;

/// Everything the management flags act on.
pub struct Stores<'a> {
    pub roles: &'a RoleStore,
    pub chats: &'a ChatSessionStore,
    pub functions_dir: &'a Path,
    pub config_file: &'a Path,
    pub platform: &'a PlatformContext,
}

/// Runs the first management flag that is set. Returns `false` when none is,
/// so the caller goes on to prompt handling.
pub fn handle_management(
    args: &CliArgs,
    stores: &Stores<'_>,
    printer: &dyn Printer,
) -> anyhow::Result<bool> {
    if let Some(id) = &args.show_chat {
        show_chat(stores.chats, id, printer)?;
    } else if args.list_chats {
        list_chats(stores.chats)?;
    } else if let Some(id) = &args.delete_chat {
        stores.chats.delete(&SessionKey::new(id.as_str()))?;
        println!("Chat \"{id}\" deleted.");
    } else if args.delete_all_chats {
        delete_all_chats(stores.chats)?;
    } else if let Some(name) = &args.create_role {
        create_role(stores.roles, name)?;
    } else if let Some(name) = &args.show_role {
        println!("{}", stores.roles.get(name)?.role);
    } else if args.list_roles {
        for path in stores.roles.list()? {
            println!("{}", path.display());
        }
    } else if let Some(name) = &args.delete_role {
        let mut input = TerminalInput::open(false)?;
        delete_role(stores.roles, name, &mut input)?;
    } else if args.install_integration {
        install_integration(stores.platform)?;
    } else if args.install_functions {
        let path = FunctionRegistry::install_defaults(stores.functions_dir)?;
        println!("Installed default functions to {}", path.display());
    } else if args.edit_config {
        editor::edit_file(stores.config_file)?;
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn show_chat(chats: &ChatSessionStore, id: &str, printer: &dyn Printer) -> Result<(), SgptError> {
    let messages = chats.read(&SessionKey::new(id))?;
    printer.history(&messages);
    Ok(())
}

fn list_chats(chats: &ChatSessionStore) -> Result<(), SgptError> {
    for key in chats.list_keys()? {
        println!("{}", chats.dir().join(format!("{key}.json")).display());
    }
    Ok(())
}

fn delete_all_chats(chats: &ChatSessionStore) -> anyhow::Result<()> {
    let mut input = TerminalInput::open(false)?;
    if !input.confirm("Delete all chats?")? {
        println!("Aborted.");
        return Ok(());
    }
    let report = chats.delete_all()?;
    for key in &report.removed {
        println!("Deleted chat \"{key}\".");
    }
    for (key, err) in &report.failed {
        eprintln!("Failed to delete chat \"{key}\": {err}");
    }
    if !report.failed.is_empty() {
        anyhow::bail!("{} chat(s) could not be deleted", report.failed.len());
    }
    Ok(())
}

fn create_role(roles: &RoleStore, name: &str) -> anyhow::Result<()> {
    let mut input = TerminalInput::open(false)?;
    let overwrite = roles.exists(name);
    if overwrite && !input.confirm(&format!("Role \"{name}\" already exists, overwrite it?"))? {
        println!("Aborted.");
        return Ok(());
    }
    let description = input
        .read_line("Enter role description:")?
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| SgptError::Usage("Role description must not be empty.".to_string()))?;
    roles.save(&Role::new(name, &description, None), overwrite)?;
    println!("Role \"{name}\" saved.");
    Ok(())
}

fn delete_role(roles: &RoleStore, name: &str, input: &mut TerminalInput) -> anyhow::Result<()> {
    if !roles.exists(name) {
        return Err(SgptError::RoleNotFound(name.to_string()).into());
    }
    if !input.confirm(&format!("Role \"{name}\" exists, delete it?"))? {
        println!("Aborted.");
        return Ok(());
    }
    roles.delete(name)?;
    println!("Role \"{name}\" deleted.");
    Ok(())
}

fn install_integration(platform: &PlatformContext) -> anyhow::Result<()> {
    let (rc, changed) = integration::install(&platform.shell)
        .with_context(|| format!("installing integration for {}", platform.shell))?;
    if changed {
        println!(
            "Shell integration installed to {}. Restart your terminal to apply it.",
            rc.display()
        );
    } else {
        println!("Shell integration is already in {}.", rc.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, Cursor};

    use super::*;

    fn answering(answer: &str) -> TerminalInput {
        let reader: Box<dyn BufRead> = Box::new(Cursor::new(format!("{answer}\n")));
        TerminalInput::lines(reader)
    }

    fn roles_with(name: &str) -> (tempfile::TempDir, RoleStore) {
        let dir = tempfile::tempdir().unwrap();
        let roles = RoleStore::new(dir.path().join("roles"));
        roles.save(&Role::new(name, "Rhyme.", None), false).unwrap();
        (dir, roles)
    }

    #[test]
    fn declined_delete_keeps_the_role() {
        let (_dir, roles) = roles_with("Poet");
        delete_role(&roles, "Poet", &mut answering("n")).unwrap();
        assert!(roles.exists("Poet"));
    }

    #[test]
    fn confirmed_delete_removes_the_role() {
        let (_dir, roles) = roles_with("Poet");
        delete_role(&roles, "Poet", &mut answering("y")).unwrap();
        assert!(!roles.exists("Poet"));
    }

    #[test]
    fn unknown_role_fails_before_asking() {
        let (_dir, roles) = roles_with("Poet");
        let err = delete_role(&roles, "Bard", &mut answering("y")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SgptError>(),
            Some(SgptError::RoleNotFound(_))
        ));
    }
}
