use crate::error::{Error, Result};
use crate::process::CommandRunner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Drives `python -m pip` for downloading and offline installation.
pub struct Pip<'a> {
    python: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> Pip<'a> {
    pub fn new(python: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            python: python.into(),
            runner,
        }
    }

    fn base_args(&self, subcommand: &str) -> Vec<String> {
        vec!["-m".to_string(), "pip".to_string(), subcommand.to_string()]
    }

    /// Download binary wheels for `package_spec` into `dest_dir`, returning
    /// their paths sorted by file name.
    pub fn download(
        &self,
        package_spec: &str,
        dest_dir: &Path,
        include_deps: bool,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dest_dir).map_err(|e| Error::io(dest_dir, e))?;

        let mut args = self.base_args("download");
        args.extend([
            package_spec.to_string(),
            "--only-binary=:all:".to_string(),
            "--dest".to_string(),
            path_arg(dest_dir),
        ]);
        if !include_deps {
            args.push("--no-deps".to_string());
        }

        info!(
            package = package_spec,
            include_deps,
            dest = %dest_dir.display(),
            "Downloading wheels"
        );
        self.runner.run(&self.python, &args)?;

        let wheels = list_wheels(dest_dir)?;
        if wheels.is_empty() {
            return Err(Error::NoWheels);
        }
        Ok(wheels)
    }

    /// Install from the wheels in `dir` with the package index disabled.
    ///
    /// With `install_deps` and a known spec, pip resolves the spec against the
    /// local wheels. Otherwise a lone wheel is installed by path, and several
    /// wheels are installed with dependency resolution turned off.
    pub fn install(
        &self,
        dir: &Path,
        package_spec: Option<&str>,
        install_deps: bool,
        force_reinstall: bool,
    ) -> Result<()> {
        let mut args = self.base_args("install");
        args.extend([
            "--no-index".to_string(),
            "--find-links".to_string(),
            path_arg(dir),
        ]);
        if force_reinstall {
            args.push("--force-reinstall".to_string());
        }

        match (install_deps, package_spec) {
            (true, Some(spec)) => args.push(spec.to_string()),
            _ => {
                if install_deps {
                    warn!(
                        "Bundle names no package; installing restored wheels without \
                         dependency resolution"
                    );
                }
                let wheels = list_wheels(dir)?;
                match (wheels.as_slice(), package_spec) {
                    ([], _) => {
                        return Err(Error::format(format!(
                            "no .whl files to install in {}",
                            dir.display()
                        )));
                    }
                    ([single], _) => args.push(path_arg(single)),
                    (_, Some(spec)) => {
                        args.push(spec.to_string());
                        args.push("--no-deps".to_string());
                    }
                    (many, None) => {
                        args.extend(many.iter().map(|p| path_arg(p)));
                        args.push("--no-deps".to_string());
                    }
                }
            }
        }

        info!(
            dir = %dir.display(),
            package = ?package_spec,
            install_deps,
            force_reinstall,
            "Installing wheels"
        );
        self.runner.run(&self.python, &args)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `.whl` files directly inside `dir`, sorted by file name.
pub fn list_wheels(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut wheels = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let is_wheel = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("whl"));
        if is_wheel && path.is_file() {
            wheels.push(path);
        }
    }

    wheels.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(wheels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"wheel").unwrap();
        path
    }

    #[test]
    fn test_download_passes_binary_only_and_no_deps() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("wheels");
        let hook_dest = dest.clone();
        let runner = RecordingRunner::with_hook(move |_| {
            fs::write(hook_dest.join("pkg-1.0-py3-none-any.whl"), b"x").unwrap();
            Ok(Vec::new())
        });

        let pip = Pip::new("python3", &runner);
        let wheels = pip.download("pkg==1.0", &dest, false).unwrap();

        assert_eq!(wheels, vec![dest.join("pkg-1.0-py3-none-any.whl")]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "python3");
        let dest_arg = dest.to_string_lossy().into_owned();
        assert_eq!(
            calls[0].args,
            strings(&[
                "-m",
                "pip",
                "download",
                "pkg==1.0",
                "--only-binary=:all:",
                "--dest",
                dest_arg.as_str(),
                "--no-deps",
            ])
        );
    }

    #[test]
    fn test_download_with_deps_omits_no_deps() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b-1.0-py3-none-any.whl");
        touch(temp_dir.path(), "a-1.0-py3-none-any.whl");
        let runner = RecordingRunner::default();

        let wheels = Pip::new("python3", &runner)
            .download("b", temp_dir.path(), true)
            .unwrap();

        let names: Vec<_> = wheels
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a-1.0-py3-none-any.whl", "b-1.0-py3-none-any.whl"]);
        assert!(!runner.calls()[0].args.contains(&"--no-deps".to_string()));
    }

    #[test]
    fn test_download_without_wheels_reports_source_fallback() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg-1.0.tar.gz");
        let runner = RecordingRunner::default();

        let err = Pip::new("python3", &runner)
            .download("pkg==1.0", temp_dir.path(), false)
            .unwrap_err();

        assert!(matches!(err, Error::NoWheels));
        assert!(err.to_string().contains("fallen back to source"));
    }

    #[test]
    fn test_download_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::with_hook(|inv| {
            Err(Error::Process {
                program: inv.program.clone(),
                code: Some(1),
                stderr: "no matching distribution".to_string(),
            })
        });

        let err = Pip::new("python3", &runner)
            .download("nope", temp_dir.path(), false)
            .unwrap_err();
        assert!(matches!(err, Error::Process { code: Some(1), .. }));
    }

    #[test]
    fn test_install_single_wheel_without_deps_uses_path() {
        let temp_dir = TempDir::new().unwrap();
        let wheel = touch(temp_dir.path(), "pkg-1.0-py3-none-any.whl");
        let runner = RecordingRunner::default();

        Pip::new("python3", &runner)
            .install(temp_dir.path(), Some("pkg==1.0"), false, true)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let args = &calls[0].args;
        assert_eq!(args.last().unwrap(), &wheel.to_string_lossy().into_owned());
        assert!(!args.contains(&"pkg==1.0".to_string()));
        assert!(args.contains(&"--no-index".to_string()));
        assert!(args.contains(&"--force-reinstall".to_string()));
    }

    #[test]
    fn test_install_with_deps_resolves_spec_once() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg-1.0-py3-none-any.whl");
        touch(temp_dir.path(), "dep-2.0-py3-none-any.whl");
        let runner = RecordingRunner::default();

        Pip::new("python3", &runner)
            .install(temp_dir.path(), Some("pkg==1.0"), true, false)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let dir_arg = temp_dir.path().to_string_lossy().into_owned();
        assert_eq!(
            calls[0].args,
            strings(&[
                "-m",
                "pip",
                "install",
                "--no-index",
                "--find-links",
                dir_arg.as_str(),
                "pkg==1.0",
            ])
        );
    }

    #[test]
    fn test_install_many_wheels_without_deps_suppresses_resolution() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg-1.0-py3-none-any.whl");
        touch(temp_dir.path(), "dep-2.0-py3-none-any.whl");
        let runner = RecordingRunner::default();

        Pip::new("python3", &runner)
            .install(temp_dir.path(), Some("pkg==1.0"), false, true)
            .unwrap();

        let args = &runner.calls()[0].args;
        let tail = &args[args.len() - 2..];
        assert_eq!(tail, ["pkg==1.0", "--no-deps"]);
    }

    #[test]
    fn test_install_without_spec_installs_wheel_paths() {
        let temp_dir = TempDir::new().unwrap();
        let a = touch(temp_dir.path(), "a-1.0-py3-none-any.whl");
        let b = touch(temp_dir.path(), "b-1.0-py3-none-any.whl");
        let runner = RecordingRunner::default();

        Pip::new("python3", &runner)
            .install(temp_dir.path(), None, true, false)
            .unwrap();

        let args = &runner.calls()[0].args;
        let tail = &args[args.len() - 3..];
        assert_eq!(
            tail,
            [
                a.to_string_lossy().into_owned(),
                b.to_string_lossy().into_owned(),
                "--no-deps".to_string(),
            ]
        );
    }

    #[test]
    fn test_install_without_wheels_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg-1.0.tar.gz");
        let runner = RecordingRunner::default();

        let err = Pip::new("python3", &runner)
            .install(temp_dir.path(), Some("pkg==1.0"), false, true)
            .unwrap_err();

        assert!(matches!(err, Error::Format(ref msg) if msg.contains("no .whl files to install")));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_install_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg-1.0-py3-none-any.whl");
        let runner = RecordingRunner::with_hook(|inv| {
            Err(Error::Process {
                program: inv.program.clone(),
                code: Some(2),
                stderr: String::new(),
            })
        });

        let err = Pip::new("python3", &runner)
            .install(temp_dir.path(), Some("pkg"), false, false)
            .unwrap_err();
        assert!(matches!(err, Error::Process { code: Some(2), .. }));
    }

    #[test]
    fn test_list_wheels_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "z-1.0-py3-none-any.whl");
        touch(temp_dir.path(), "notes.txt");
        fs::create_dir(temp_dir.path().join("dir.whl")).unwrap();

        let wheels = list_wheels(temp_dir.path()).unwrap();
        assert_eq!(wheels, vec![temp_dir.path().join("z-1.0-py3-none-any.whl")]);
    }
}
