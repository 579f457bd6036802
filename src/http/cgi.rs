//! CGI execution: runs a `cgi-bin` program as a child process and
//! captures its stdout as the response body.
//!
//! A more traditional CGI runner `fork()`s and `execve()`s the child
//! directly, with the parent and child rendezvousing through a shared
//! temp file. This one uses [`std::process::Command`] with the child's
//! stdout redirected onto that same temp file, which gives an identical
//! observable contract (child's stdout lands in the file, parent blocks
//! until the child exits, file is read back and deleted) without hand
//! rolling `fork`/`execve`/argv pointers in a multi-threaded process.

use std::fs::OpenOptions;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Substring that marks a request as a CGI request, searched for
/// anywhere in the resolved resource path.
pub const CGI_MARKER: &str = "cgi-bin";

/// Argument separator within the resolved URL, also used to join the
/// per-request temp file contents back out.
const ARG_SEPARATOR: char = '&';

pub struct CgiRunner {
    program_path: String,
    arguments: Vec<String>,
}

impl CgiRunner {
    /// Parse a resolved resource path of the form
    /// `.../cgi-bin/prog&arg1&arg2` into a program path and argument
    /// vector. Returns `None` if the path isn't a CGI request.
    pub fn parse(resource_path: &str) -> Option<Self> {
        if !resource_path.contains(CGI_MARKER) {
            return None;
        }
        let cgi_pos = resource_path.find(CGI_MARKER)?;
        let separator = resource_path[cgi_pos..].find(ARG_SEPARATOR).map(|i| cgi_pos + i);
        let (program_path, arguments) = match separator {
            Some(sep) => {
                let args = resource_path[sep + 1..]
                    .split(ARG_SEPARATOR)
                    .map(str::to_string)
                    .collect();
                (resource_path[..sep].to_string(), args)
            }
            None => (resource_path.to_string(), Vec::new()),
        };
        Some(Self { program_path, arguments })
    }

    pub fn program_path(&self) -> &str {
        &self.program_path
    }

    /// Spawn the CGI program with its stdout landing in a per-thread
    /// temp file, wait for it to exit, then return that file's contents.
    /// Any failure along the way (open, spawn, wait, read) is reported
    /// as the response body itself rather than propagated — the server
    /// must stay up across CGI faults.
    pub fn run(&self) -> Vec<u8> {
        let temp_path = temp_file_path();

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .append(true)
            .create(true)
            .mode(0o600)
            .custom_flags(libc::O_CLOEXEC)
            .open(&temp_path)
        {
            Ok(f) => f,
            Err(err) => return format!("fail to create/open the file {}: {err}", temp_path.display()).into_bytes(),
        };

        let stdout_fd = match file.try_clone() {
            Ok(f) => Stdio::from(f),
            Err(err) => return format!("fail to duplicate temp file handle: {err}").into_bytes(),
        };

        let child = Command::new(&self.program_path)
            .args(&self.arguments)
            .stdout(stdout_fd)
            .stdin(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(c) => c,
            Err(err) => return format!("fail to spawn CGI program: {err}").into_bytes(),
        };

        drop(file);

        match child.wait() {
            Ok(_status) => {}
            Err(err) => return format!("fail to wait on CGI child: {err}").into_bytes(),
        }

        let result = read_and_delete(&temp_path);
        result.unwrap_or_else(|err| format!("fail to read CGI output: {err}").into_bytes())
    }
}

fn read_and_delete(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::fs::File::open(path)?.read_to_end(&mut buf)?;
    let _ = std::fs::remove_file(path);
    Ok(buf)
}

/// `cgi_temp_<thread_id>.txt` in the current working directory, where
/// `thread_id` is the kernel thread id (distinct per reactor thread, so
/// concurrent CGI requests on different reactors never collide).
fn temp_file_path() -> std::path::PathBuf {
    let tid = unsafe { libc::syscall(libc::SYS_gettid) };
    std::path::PathBuf::from(format!("cgi_temp_{tid}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_cgi_path_is_not_parsed() {
        assert!(CgiRunner::parse("/index.html").is_none());
    }

    #[test]
    fn parses_program_and_arguments() {
        let runner = CgiRunner::parse("/var/www/cgi-bin/echo&hello&world").unwrap();
        assert_eq!(runner.program_path(), "/var/www/cgi-bin/echo");
        assert_eq!(runner.arguments, vec!["hello", "world"]);
    }

    #[test]
    fn cgi_path_with_no_arguments_is_valid() {
        let runner = CgiRunner::parse("/var/www/cgi-bin/echo").unwrap();
        assert_eq!(runner.program_path(), "/var/www/cgi-bin/echo");
        assert!(runner.arguments.is_empty());
    }

    #[test]
    fn run_captures_child_stdout() {
        let runner = CgiRunner { program_path: "/bin/echo".to_string(), arguments: vec!["hello".to_string(), "world".to_string()] };
        let output = runner.run();
        assert_eq!(String::from_utf8(output).unwrap(), "hello world\n");
    }

    #[test]
    fn run_reports_spawn_failure_as_body_without_crashing() {
        let runner = CgiRunner { program_path: "/nonexistent/program".to_string(), arguments: Vec::new() };
        let output = runner.run();
        assert!(!output.is_empty());
    }
}
