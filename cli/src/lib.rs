//! Command parsing and dispatch for the `fatvfs` shell.
//!
//! Grounded on `examples/ShHaWkK-The_Heap/fat32/src/main.rs` (the shell
//! loop shape: read a line, split on whitespace, match the first token, and
//! the `current_dir` string tracked alongside the engine) and
//! `original_source/fat32/src/terminal.cpp` (the `/`-prefix convention for
//! VFS-scope commands versus unprefixed in-filesystem commands, its own
//! `path` member updated on `cd`, and the per-command environment check —
//! VFS commands run in any state, filesystem commands only once something
//! is mounted).
//!
//! `Shell::execute` takes one already-read line; it is the whole surface
//! `main`'s REPL and `--cmd` one-shot mode both call through, so the
//! command table is tested without spinning up stdin.

use std::path::Path;

use vfs_core::{FsType, Registry, VfsError};

/// What the REPL should do after one line was executed.
pub enum Outcome {
    /// Print this (possibly multi-line, possibly empty) text and continue.
    Continue(String),
    /// Terminate with this process exit code.
    Exit(i32),
}

/// Wraps a `Registry` with the path cursor the engine itself doesn't track
/// (a directory only knows its own and its parent's *cluster*, not a full
/// path string) so the prompt can show `/path>` per spec.md §6.
pub struct Shell {
    registry: Registry,
    path: Vec<String>,
}

impl Shell {
    pub fn new(registry: Registry) -> Self {
        Self { registry, path: Vec::new() }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// `-> ` unmounted, `/path> ` mounted — spec.md §6.
    pub fn prompt(&self) -> String {
        match self.registry.mounted_name() {
            Some(disk) => format!("/{disk}{}> ", self.path_suffix()),
            None => "-> ".to_string(),
        }
    }

    fn path_suffix(&self) -> String {
        self.path.iter().map(|c| format!("/{c}")).collect()
    }

    /// Parses and runs one command line. Never panics: every failure
    /// becomes a single-line diagnostic in `Outcome::Continue`, matching
    /// spec.md §7 ("every error produces a single-line diagnostic", and VFS-
    /// layer errors are warnings, not session-ending).
    pub fn execute(&mut self, line: &str) -> Outcome {
        let line = line.trim();
        if line.is_empty() {
            return Outcome::Continue(String::new());
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "exit" => Outcome::Exit(0),
            "/help" => Outcome::Continue(help_text()),
            "/clear" => Outcome::Continue("\x1B[2J\x1B[1;1H".to_string()),
            "/vfs" => Outcome::Continue(self.dispatch_vfs(&parts[1..])),
            _ => Outcome::Continue(self.dispatch_fs(&parts)),
        }
    }

    fn dispatch_vfs(&mut self, args: &[&str]) -> String {
        match args.first().copied() {
            None => help_text(),
            Some("ls") => {
                let rows = self.registry.ls();
                if rows.is_empty() {
                    "no disks registered".to_string()
                } else {
                    rows.iter()
                        .map(|(name, fs_type, mounted)| {
                            let tag = if *mounted { " [mounted]" } else { "" };
                            format!("{name} ({}){tag}", fs_type.as_str())
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Some("add") => match args.get(1) {
                None => "usage: /vfs add <name> [fs_type]".to_string(),
                Some(name) => {
                    let fs_type = args.get(2).copied();
                    match self.registry.add(name, fs_type) {
                        Ok(()) => {
                            format!("registered {name:?} ({})", fs_type.unwrap_or(FsType::DEFAULT))
                        }
                        Err(e) => warning(&e),
                    }
                }
            },
            Some("rm") => match args.get(1) {
                None => "usage: /vfs rm <name>".to_string(),
                Some(name) => match self.registry.rm(name) {
                    Ok(()) => {
                        self.path.clear();
                        format!("removed {name:?}")
                    }
                    Err(e) => warning(&e),
                },
            },
            Some("mnt") => match args.get(1) {
                None => "usage: /vfs mnt <name>".to_string(),
                Some(name) => match self.registry.mnt(name) {
                    Ok(()) => {
                        self.path.clear();
                        format!("mounted {name:?}")
                    }
                    Err(e) => warning(&e),
                },
            },
            Some("umnt") => {
                self.registry.umnt();
                self.path.clear();
                "unmounted".to_string()
            }
            Some(other) => format!("unknown /vfs command {other:?}; try /vfs"),
        }
    }

    fn dispatch_fs(&mut self, parts: &[&str]) -> String {
        let cmd = parts[0];
        let args = &parts[1..];

        let fs = match self.registry.fs_mut() {
            Ok(fs) => fs,
            Err(e) => return warning(&e),
        };

        match cmd {
            "ls" => fs
                .ls()
                .iter()
                .map(|e| {
                    let kind = if e.is_directory { "DIR " } else { "FILE" };
                    format!("{kind} {:<10} {:>8} bytes", e.name_str(), e.size)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            "mkdir" => match args.first() {
                None => "usage: mkdir <name>".to_string(),
                Some(name) => match fs.mkdir(name) {
                    Ok(()) => String::new(),
                    Err(e) => warning_fat(&e),
                },
            },
            "cd" => match args.first() {
                None => "usage: cd <name>".to_string(),
                Some(name) => match fs.cd(name) {
                    Ok(()) => {
                        self.apply_cd(name);
                        String::new()
                    }
                    Err(e) => warning_fat(&e),
                },
            },
            "touch" => match args.first() {
                None => "usage: touch <name>".to_string(),
                Some(name) => match fs.touch(name) {
                    Ok(()) => String::new(),
                    Err(e) => warning_fat(&e),
                },
            },
            "cat" => match args.first() {
                None => "usage: cat <name>".to_string(),
                Some(name) => match fs.cat(name) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => warning_fat(&e),
                },
            },
            "rm" => match args.first() {
                None => "usage: rm <name> [-r]".to_string(),
                Some(name) => {
                    let recursive = args[1..].iter().any(|&f| f == "-r" || f == "--recursive");
                    match fs.rm(name, recursive) {
                        Ok(()) => String::new(),
                        Err(e) => warning_fat(&e),
                    }
                }
            },
            "mv" => match (args.first(), args.get(1)) {
                (Some(src), Some(dst)) => match fs.mv(src, dst) {
                    Ok(()) => String::new(),
                    Err(e) => warning_fat(&e),
                },
                _ => "usage: mv <src> <dst>".to_string(),
            },
            "cp" => {
                if args.first().copied() == Some("ext") {
                    match (args.get(1), args.get(2)) {
                        (Some(src), Some(dst)) => match fs.import_host_file(Path::new(src), dst) {
                            Ok(()) => String::new(),
                            Err(e) => warning_fat(&e),
                        },
                        _ => "usage: cp ext <host_path> <dst>".to_string(),
                    }
                } else {
                    match (args.first(), args.get(1)) {
                        (Some(src), Some(dst)) => match fs.cp(src, dst) {
                            Ok(()) => String::new(),
                            Err(e) => warning_fat(&e),
                        },
                        _ => "usage: cp [ext] <src> <dst>".to_string(),
                    }
                }
            }
            other => format!("unknown command {other:?}; try /help"),
        }
    }

    /// Mirrors `cd`'s effect on the path cursor: `.` is a no-op, `..` pops
    /// (saturating at root), anything else pushes a component.
    fn apply_cd(&mut self, name: &str) {
        match name {
            "." => {}
            ".." => {
                self.path.pop();
            }
            other => self.path.push(other.to_string()),
        }
    }
}

fn help_text() -> String {
    "commands:\n\
     \x20 /help                          this help\n\
     \x20 /vfs                           VFS help\n\
     \x20 /vfs ls                        list registered disks\n\
     \x20 /vfs add <name> [fs_type]      register a disk (default fs_type: fat32)\n\
     \x20 /vfs rm <name>                 deregister a disk\n\
     \x20 /vfs mnt <name>                mount a disk\n\
     \x20 /vfs umnt                      unmount the current disk\n\
     \x20 /clear                         clear the screen\n\
     \x20 ls                             list the current directory (mounted)\n\
     \x20 mkdir <name>                   create a directory (mounted)\n\
     \x20 cd <name>                      change directory (mounted)\n\
     \x20 touch <name>                   create an empty file (mounted)\n\
     \x20 cat <name>                     print a file's bytes (mounted)\n\
     \x20 rm <name> [-r]                 remove an entry (mounted)\n\
     \x20 mv <src> <dst>                 rename within the current directory (mounted)\n\
     \x20 cp [ext] <src> <dst>           copy, or import a host file with `ext` (mounted)\n\
     \x20 exit                           quit"
        .to_string()
}

fn warning(e: &VfsError) -> String {
    format!("warning: {e}")
}

fn warning_fat(e: &fat32_core::FatError) -> String {
    format!("warning: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fat32_core::FatConfig;

    fn shell(dir: &std::path::Path) -> Shell {
        Shell::new(Registry::new(dir, FatConfig::default()))
    }

    fn run(line: &str, shell: &mut Shell) -> String {
        match shell.execute(line) {
            Outcome::Continue(s) => s,
            Outcome::Exit(_) => "<exit>".to_string(),
        }
    }

    #[test]
    fn exit_signals_process_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        assert!(matches!(sh.execute("exit"), Outcome::Exit(0)));
    }

    #[test]
    fn fs_command_before_mount_is_rejected_not_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        let out = run("ls", &mut sh);
        assert!(out.contains("no disk is currently mounted"));
    }

    #[test]
    fn scenario_add_mount_mkdir_cd_touch_ls() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        run("/vfs add A", &mut sh);
        run("/vfs mnt A", &mut sh);
        run("mkdir foo", &mut sh);
        run("cd foo", &mut sh);
        run("touch bar", &mut sh);
        let out = run("ls", &mut sh);
        assert!(out.contains("bar"));
        assert!(out.contains('.'));
    }

    #[test]
    fn vfs_ls_marks_the_mounted_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        run("/vfs add A", &mut sh);
        run("/vfs mnt A", &mut sh);
        let out = run("/vfs ls", &mut sh);
        assert!(out.contains("A (fat32) [mounted]"));
    }

    #[test]
    fn mnt_while_mounted_is_a_warning_not_a_crash() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        run("/vfs add A", &mut sh);
        run("/vfs add B", &mut sh);
        run("/vfs mnt A", &mut sh);
        let out = run("/vfs mnt B", &mut sh);
        assert!(out.contains("warning"));
        assert_eq!(sh.registry().mounted_name(), Some("A"));
    }

    #[test]
    fn prompt_shows_dash_arrow_unmounted_and_path_after_cd() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        assert_eq!(sh.prompt(), "-> ");
        run("/vfs add A", &mut sh);
        run("/vfs mnt A", &mut sh);
        assert_eq!(sh.prompt(), "/A> ");
        run("mkdir foo", &mut sh);
        run("cd foo", &mut sh);
        assert_eq!(sh.prompt(), "/A/foo> ");
        run("cd ..", &mut sh);
        assert_eq!(sh.prompt(), "/A> ");
    }

    #[test]
    fn rm_recursive_flag_removes_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        run("/vfs add A", &mut sh);
        run("/vfs mnt A", &mut sh);
        run("mkdir foo", &mut sh);
        run("cd foo", &mut sh);
        run("touch bar", &mut sh);
        run("cd ..", &mut sh);
        let denied = run("rm foo", &mut sh);
        assert!(denied.contains("warning"));
        let removed = run("rm foo -r", &mut sh);
        assert!(!removed.contains("warning"));
    }
}
