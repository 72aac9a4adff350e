//! Class Loader Graph
//!
//! Registry of class loaders and the heap references they own (mirrors,
//! static fields, loader objects). A loader is either kept alive by the
//! runtime (boot, platform and application loaders, or any loader still
//! strongly reachable) or is a candidate for unloading.

use super::lock::VmLock;
use parking_lot::RwLock;

/// Per-loader data
#[derive(Debug, Clone)]
pub struct ClassLoaderData {
    pub name: String,
    /// Strong root: not a candidate for unloading
    pub keep_alive: bool,
    pub oops: Vec<usize>,
}

/// Graph of loaded class loaders
#[derive(Debug)]
pub struct ClassLoaderGraph {
    lock: VmLock,
    loaders: RwLock<Vec<ClassLoaderData>>,
}

impl ClassLoaderGraph {
    pub fn new() -> Self {
        Self {
            lock: VmLock::new("ClassLoaderDataGraph_lock"),
            loaders: RwLock::new(Vec::new()),
        }
    }

    pub fn lock(&self) -> &VmLock {
        &self.lock
    }

    /// Add a loader to the graph, taking the lock unless already held
    pub fn add_loader(&self, name: &str, keep_alive: bool, oops: Vec<usize>) {
        let _guard = self.lock.lock_unless_owned();
        self.loaders.write().push(ClassLoaderData {
            name: name.to_string(),
            keep_alive,
            oops,
        });
    }

    /// Drop the keep-alive flag so the loader becomes an unloading candidate
    pub fn release_loader(&self, name: &str) -> bool {
        let _guard = self.lock.lock_unless_owned();
        let mut loaders = self.loaders.write();
        match loaders.iter_mut().find(|l| l.name == name) {
            Some(loader) => {
                loader.keep_alive = false;
                true
            },
            None => false,
        }
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.read().len()
    }

    /// Visit references of every loader
    pub fn cld_do(&self, oops: &mut dyn FnMut(usize)) {
        self.loaders_do(oops, false);
    }

    /// Visit references of loaders that are kept alive
    pub fn roots_cld_do(&self, oops: &mut dyn FnMut(usize)) {
        self.loaders_do(oops, true);
    }

    fn loaders_do(&self, oops: &mut dyn FnMut(usize), strong_only: bool) {
        for loader in self.loaders.read().iter() {
            if strong_only && !loader.keep_alive {
                continue;
            }
            for &oop in &loader.oops {
                if oop != 0 {
                    oops(oop);
                }
            }
        }
    }
}

impl Default for ClassLoaderGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ClassLoaderGraph {
        let graph = ClassLoaderGraph::new();
        graph.add_loader("boot", true, vec![0x100, 0x108]);
        graph.add_loader("plugin", false, vec![0x200]);
        graph.add_loader("app", true, vec![0x300]);
        graph
    }

    #[test]
    fn test_cld_do_visits_all_loaders() {
        let graph = graph();
        let mut seen = Vec::new();
        graph.cld_do(&mut |r| seen.push(r));
        assert_eq!(seen, vec![0x100, 0x108, 0x200, 0x300]);
    }

    #[test]
    fn test_roots_cld_do_skips_unloading_candidates() {
        let graph = graph();
        let mut seen = Vec::new();
        graph.roots_cld_do(&mut |r| seen.push(r));
        assert_eq!(seen, vec![0x100, 0x108, 0x300]);
    }

    #[test]
    fn test_release_loader() {
        let graph = graph();
        assert!(graph.release_loader("app"));
        assert!(!graph.release_loader("missing"));

        let mut seen = Vec::new();
        graph.roots_cld_do(&mut |r| seen.push(r));
        assert_eq!(seen, vec![0x100, 0x108]);
        assert_eq!(graph.loader_count(), 3);
    }
}
