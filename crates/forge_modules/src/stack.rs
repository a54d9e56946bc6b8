//! Stacks: modules rendered together into one configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use forge_hcl::HclGenerator;
use tracing::{debug, info};

use crate::error::{ModuleError, ModuleResult};
use crate::module::TerraformModule;

/// An ordered set of modules plus the dependencies between them.
///
/// Modules render in insertion order. Dependencies are keyed by local name
/// and only used for validation and [`Stack::deployment_order`].
pub struct Stack {
    name: String,
    modules: Vec<Box<dyn TerraformModule>>,
    dependencies: BTreeMap<String, Vec<String>>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_module<M: TerraformModule + 'static>(&mut self, module: M) {
        self.modules.push(Box::new(module));
    }

    pub fn with_module<M: TerraformModule + 'static>(mut self, module: M) -> Self {
        self.add_module(module);
        self
    }

    /// Record that `module` must be applied after `depends_on`.
    pub fn add_dependency(&mut self, module: impl Into<String>, depends_on: impl Into<String>) {
        self.dependencies
            .entry(module.into())
            .or_default()
            .push(depends_on.into());
    }

    pub fn with_dependency(mut self, module: impl Into<String>, depends_on: impl Into<String>) -> Self {
        self.add_dependency(module, depends_on);
        self
    }

    pub fn get(&self, local_name: &str) -> Option<&dyn TerraformModule> {
        self.modules
            .iter()
            .find(|m| m.local_name() == local_name)
            .map(|m| m.as_ref())
    }

    pub fn modules(&self) -> impl Iterator<Item = &dyn TerraformModule> {
        self.modules.iter().map(|m| m.as_ref())
    }

    pub fn dependencies_of(&self, local_name: &str) -> &[String] {
        self.dependencies
            .get(local_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Validate every module, then the dependency graph.
    pub fn validate(&self) -> ModuleResult<()> {
        let mut seen = BTreeSet::new();
        for module in &self.modules {
            if !seen.insert(module.local_name()) {
                return Err(ModuleError::DuplicateModule(module.local_name().to_string()));
            }
        }

        for module in &self.modules {
            module.validate()?;
        }

        for (module, deps) in &self.dependencies {
            if !seen.contains(module.as_str()) {
                return Err(ModuleError::validation(
                    module,
                    "dependencies declared for a module that is not in the stack",
                ));
            }
            for dep in deps {
                if !seen.contains(dep.as_str()) {
                    return Err(ModuleError::UnknownDependency {
                        module: module.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        self.deployment_order().map(|_| ())
    }

    /// Local names ordered so that every module follows its dependencies.
    ///
    /// Ties keep insertion order.
    pub fn deployment_order(&self) -> ModuleResult<Vec<&str>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            stack: &'a Stack,
            name: &'a str,
            marks: &mut BTreeMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
            order: &mut Vec<&'a str>,
        ) -> ModuleResult<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|n| *n == name).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[start..].to_vec();
                    cycle.push(name);
                    return Err(ModuleError::DependencyCycle(cycle.join(" -> ")));
                }
                None => {}
            }

            marks.insert(name, Mark::Visiting);
            path.push(name);
            for dep in stack.dependencies_of(name) {
                visit(stack, dep, marks, path, order)?;
            }
            path.pop();
            marks.insert(name, Mark::Done);
            order.push(name);
            Ok(())
        }

        let mut marks = BTreeMap::new();
        let mut order = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let mut path = Vec::new();
            visit(self, module.local_name(), &mut marks, &mut path, &mut order)?;
        }
        Ok(order)
    }

    /// Render every module, separated by a blank line.
    pub fn to_hcl(&self, generator: &HclGenerator) -> ModuleResult<String> {
        info!(stack = %self.name, modules = self.modules.len(), "Rendering stack");

        let mut rendered = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            debug!(module = module.local_name(), "Rendering module");
            rendered.push(module.to_hcl(generator)?);
        }
        Ok(rendered.join("\n"))
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field(
                "modules",
                &self.modules.iter().map(|m| m.local_name()).collect::<Vec<_>>(),
            )
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::BaseModule;
    use forge_hcl::Object;

    fn module(name: &str) -> BaseModule {
        BaseModule::new(name, format!("mod/{}", name))
            .with_body(Object::builder().attr("enabled", true).build())
    }

    #[test]
    fn test_to_hcl_separates_modules() {
        let stack = Stack::new("app").with_module(module("a")).with_module(module("b"));
        let hcl = stack.to_hcl(&HclGenerator::default()).unwrap();
        assert_eq!(
            hcl,
            "module \"a\" {\n  source = \"mod/a\"\n  enabled = true\n}\n\n\
             module \"b\" {\n  source = \"mod/b\"\n  enabled = true\n}\n"
        );
    }

    #[test]
    fn test_empty_stack() {
        let stack = Stack::new("empty");
        assert!(stack.is_empty());
        assert!(stack.validate().is_ok());
        assert_eq!(stack.to_hcl(&HclGenerator::default()).unwrap(), "");
    }

    #[test]
    fn test_duplicate_module() {
        let stack = Stack::new("app").with_module(module("a")).with_module(module("a"));
        assert!(matches!(stack.validate(), Err(ModuleError::DuplicateModule(name)) if name == "a"));
    }

    #[test]
    fn test_unknown_dependency() {
        let stack = Stack::new("app").with_module(module("api")).with_dependency("api", "db");
        let err = stack.validate().unwrap_err();
        assert_eq!(err.to_string(), "Module api depends on unknown module db");
    }

    #[test]
    fn test_deployment_order() {
        let stack = Stack::new("app")
            .with_module(module("api"))
            .with_module(module("queue"))
            .with_module(module("bucket"))
            .with_dependency("api", "queue")
            .with_dependency("queue", "bucket");
        assert!(stack.validate().is_ok());
        assert_eq!(stack.deployment_order().unwrap(), vec!["bucket", "queue", "api"]);
    }

    #[test]
    fn test_cycle_reports_path() {
        let stack = Stack::new("app")
            .with_module(module("a"))
            .with_module(module("b"))
            .with_dependency("a", "b")
            .with_dependency("b", "a");
        let err = stack.validate().unwrap_err();
        assert_eq!(err.to_string(), "Dependency cycle: a -> b -> a");
    }

    #[test]
    fn test_module_validation_runs() {
        let stack = Stack::new("app").with_module(BaseModule::new("broken", ""));
        assert!(matches!(stack.validate(), Err(ModuleError::Validation { .. })));
    }

    #[test]
    fn test_get() {
        let stack = Stack::new("app").with_module(module("a"));
        assert_eq!(stack.get("a").map(|m| m.source()), Some("mod/a"));
        assert!(stack.get("b").is_none());
        assert_eq!(stack.len(), 1);
    }
}
