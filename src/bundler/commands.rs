//! Argument vectors for every external tool invocation.
//!
//! These builders are pure; [`Bundler`](super::Bundler) adds the working
//! directory and environment before running them.

use std::path::Path;

use crate::shell::ToolCommand;

/// Exit status of the probe script when the gem cannot be loaded.
pub const PROBE_NOT_LOADABLE: i32 = 3;

/// Ruby loaded by `bundle exec`: require the gem named in `ARGV[0]`, then
/// print its `VERSION_INFO` constant if it has one, else its gem version.
const PROBE_SCRIPT: &str = r##"name = ARGV.fetch(0)
begin
  require name
rescue LoadError
  exit 3
end
mod_name = Object.constants.find { |c| c.to_s.downcase == name.delete("-_").downcase }
mod = mod_name && Object.const_get(mod_name)
if mod.is_a?(Module) && mod.const_defined?(:VERSION_INFO)
  puts mod.const_get(:VERSION_INFO)
else
  spec = Gem.loaded_specs[name]
  puts "#{name} #{spec ? spec.version : 'unknown'}"
end
"##;

fn bundle<'a>(args: impl IntoIterator<Item = &'a str>) -> ToolCommand {
    ToolCommand::new("bundle").args(args)
}

/// `ruby -v`
pub fn ruby_version() -> ToolCommand {
    ToolCommand::new("ruby").arg("-v")
}

/// `bundle -v`
pub fn bundler_version() -> ToolCommand {
    bundle(["-v"])
}

/// `bundle config`
pub fn config() -> ToolCommand {
    bundle(["config"])
}

/// `bundle install --path <path>` (may hit the network).
pub fn install(path: &str) -> ToolCommand {
    bundle(["install", "--path", path])
}

/// `bundle install --local --path <path>` (cache only).
pub fn install_local(path: &str) -> ToolCommand {
    bundle(["install", "--local", "--path", path])
}

/// `bundle lock --add-platform <platforms...>`
pub fn lock_add_platforms(platforms: &[String]) -> ToolCommand {
    bundle(["lock", "--add-platform"]).args(platforms.iter().map(String::as_str))
}

/// `bundle lock --add-checksums`
pub fn lock_add_checksums() -> ToolCommand {
    bundle(["lock", "--add-checksums"])
}

/// `bundle cache --all --all-platforms`
pub fn cache_all() -> ToolCommand {
    bundle(["cache", "--all", "--all-platforms"])
}

/// `bundle binstubs --all --path <bin>`
pub fn binstubs(bin: &str) -> ToolCommand {
    bundle(["binstubs", "--all", "--path", bin])
}

/// `bundle list --paths`
pub fn list_paths() -> ToolCommand {
    bundle(["list", "--paths"])
}

/// `bundle doctor`
pub fn doctor() -> ToolCommand {
    bundle(["doctor"])
}

/// `ldd <file>`
pub fn ldd(file: &Path) -> ToolCommand {
    ToolCommand::new("ldd").arg(file.to_string_lossy())
}

/// `bundle exec ruby -e <probe> <gem>`
pub fn probe_gem(gem: &str) -> ToolCommand {
    bundle(["exec", "ruby", "-e", PROBE_SCRIPT, gem])
}
