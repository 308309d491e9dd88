// src/resolver/provider.rs

//! Choosing one registry package among several that satisfy a dependency
//!
//! Unlike pacman, a menu is shown even when a package with the exact name
//! exists: the usual choice is between `foo` and `foo-git`.

use super::pool::{Pool, ResolveOptions};
use crate::error::{Error, Result};
use crate::registry::RemotePackage;
use crate::version::{Depend, satisfies_name};
use std::cmp::Ordering;
use std::io::{self, Write};
use tracing::debug;

/// Exact name matches first, then by name
fn provider_order(dep_name: &str) -> impl Fn(&RemotePackage, &RemotePackage) -> Ordering + '_ {
    move |a, b| {
        let a_exact = a.name == dep_name;
        let b_exact = b.name == dep_name;
        b_exact.cmp(&a_exact).then_with(|| a.name.cmp(&b.name))
    }
}

impl Pool<'_> {
    /// Promote a cached registry record to a satisfier of `dep`
    ///
    /// Returns `Ok(None)` when nothing in the cache satisfies `dep`, and
    /// [`Error::NoProviderSelected`] when a menu was needed but no answer
    /// could be read.
    pub fn find_satisfier_remote_cache(
        &self,
        dep: &str,
        opts: &ResolveOptions,
    ) -> Result<Option<RemotePackage>> {
        let dep_name = Depend::parse(dep).name;

        // Keep what is installed when the registry has it under the same name
        if self.db.local_package(&dep_name).is_some() {
            if let Some(pkg) = self.remote_cache.get(dep) {
                if satisfies_name(&pkg.name, &pkg.version, dep) {
                    return Ok(Some(pkg.clone()));
                }
            }
        }

        let mut providers: Vec<&RemotePackage> = self
            .remote_cache
            .values()
            .filter(|pkg| pkg.satisfies(dep))
            .collect();

        match providers.len() {
            0 => return Ok(None),
            1 => return Ok(Some(providers[0].clone())),
            _ => {}
        }

        let order = provider_order(&dep_name);
        providers.sort_by(|a, b| order(*a, *b));

        if opts.ignore_providers {
            let named_target = providers
                .iter()
                .find(|pkg| self.targets.iter().any(|t| t.name == pkg.name));
            if let Some(pkg) = named_target {
                debug!("{} satisfies {} as a named target", pkg.name, dep);
                return Ok(Some((*pkg).clone()));
            }
        }

        if !opts.provides {
            return Ok(Some(providers[0].clone()));
        }

        self.provider_menu(dep, &providers, opts.no_confirm)
            .map(|pkg| Some(pkg.clone()))
    }

    fn provider_menu<'p>(
        &self,
        dep: &str,
        providers: &[&'p RemotePackage],
        no_confirm: bool,
    ) -> Result<&'p RemotePackage> {
        let mut stdout = io::stdout();

        writeln!(stdout, "There are {} providers available for {}:", providers.len(), dep)?;
        writeln!(stdout, ":: Repository AUR")?;
        let listing: Vec<String> = providers
            .iter()
            .enumerate()
            .map(|(i, pkg)| format!("{}) {}", i + 1, pkg.name))
            .collect();
        writeln!(stdout, "    {}", listing.join(" "))?;

        let mut input = match self.input.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        loop {
            write!(stdout, "\nEnter a number (default=1): ")?;
            stdout.flush()?;

            if no_confirm {
                writeln!(stdout, "1")?;
                return Ok(providers[0]);
            }

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(Error::NoProviderSelected(dep.to_string()));
            }

            let answer = line.trim();
            if answer.is_empty() {
                return Ok(providers[0]);
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=providers.len()).contains(&n) => return Ok(providers[n - 1]),
                Ok(n) => writeln!(
                    stdout,
                    "invalid value: {} is not between 1 and {}",
                    n,
                    providers.len()
                )?,
                Err(_) => writeln!(stdout, "invalid number: {}", answer)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpm::{PackageDb, RepoPackage};
    use crate::registry::Registry;
    use std::io::Cursor;

    struct EmptyRegistry;

    impl Registry for EmptyRegistry {
        fn info(&self, _names: &[String]) -> Result<Vec<RemotePackage>> {
            Ok(Vec::new())
        }

        fn search(&self, _query: &str) -> Result<Vec<RemotePackage>> {
            Ok(Vec::new())
        }
    }

    fn cached_pool<'a>(db: &'a PackageDb, registry: &'a EmptyRegistry, input: &str) -> Pool<'a> {
        let mut pool = Pool::new(db, registry).with_input(Cursor::new(input.to_string()));
        for pkg in [
            RemotePackage::new("yay-git", "12.0.r1-1").with_provides(&["yay"]),
            RemotePackage::new("yay-bin", "12.3-1").with_provides(&["yay=12.3"]),
            RemotePackage::new("yay", "12.3-1"),
            RemotePackage::new("paru", "2.0-1"),
        ] {
            pool.remote_cache.insert(pkg.name.clone(), pkg);
        }
        pool
    }

    fn interactive() -> ResolveOptions {
        ResolveOptions {
            no_confirm: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_candidate() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        let pkg = pool.find_satisfier_remote_cache("paru", &interactive()).unwrap().unwrap();
        assert_eq!(pkg.name, "paru");
    }

    #[test]
    fn test_no_candidate() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        assert!(pool.find_satisfier_remote_cache("nope", &interactive()).unwrap().is_none());
    }

    #[test]
    fn test_menu_default_choice_is_exact_name() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "\n");
        let pkg = pool.find_satisfier_remote_cache("yay", &interactive()).unwrap().unwrap();
        assert_eq!(pkg.name, "yay");
    }

    #[test]
    fn test_menu_numbered_choice() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        // Sorted: yay, yay-bin, yay-git; invalid answers are asked again
        let pool = cached_pool(&db, &registry, "x\n7\n3\n");
        let pkg = pool.find_satisfier_remote_cache("yay", &interactive()).unwrap().unwrap();
        assert_eq!(pkg.name, "yay-git");
    }

    #[test]
    fn test_menu_closed_input() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        let err = pool.find_satisfier_remote_cache("yay", &interactive()).unwrap_err();
        assert!(matches!(err, Error::NoProviderSelected(dep) if dep == "yay"));
    }

    #[test]
    fn test_no_confirm_takes_first() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        let opts = ResolveOptions {
            no_confirm: true,
            ..Default::default()
        };
        let pkg = pool.find_satisfier_remote_cache("yay>=12", &opts).unwrap().unwrap();
        assert_eq!(pkg.name, "yay");
    }

    #[test]
    fn test_provides_disabled_skips_menu() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        let opts = ResolveOptions {
            provides: false,
            ..Default::default()
        };
        let pkg = pool.find_satisfier_remote_cache("yay", &opts).unwrap().unwrap();
        assert_eq!(pkg.name, "yay");
    }

    #[test]
    fn test_ignore_providers_prefers_target() {
        let db = PackageDb::new();
        let registry = EmptyRegistry;
        let mut pool = cached_pool(&db, &registry, "");
        pool.targets.push(crate::target::Target::parse("yay-bin"));
        let opts = ResolveOptions {
            ignore_providers: true,
            ..Default::default()
        };
        let pkg = pool.find_satisfier_remote_cache("yay", &opts).unwrap().unwrap();
        assert_eq!(pkg.name, "yay-bin");
    }

    #[test]
    fn test_installed_fast_path() {
        let db = PackageDb::new().with_local(RepoPackage::new("yay", "12.3-1"));
        let registry = EmptyRegistry;
        let pool = cached_pool(&db, &registry, "");
        let pkg = pool.find_satisfier_remote_cache("yay", &interactive()).unwrap().unwrap();
        assert_eq!(pkg.name, "yay");
    }
}
