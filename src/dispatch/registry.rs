use std::collections::HashMap;

use tracing::{debug, warn};

use super::{
    alias::AliasTable,
    controller::{Controller, ControllerBuilder},
    route::Route,
    BuildError,
};

const CONTROLLER_SUFFIX: &str = "Controller";

/// Derives the URL alias of a controller from its declared name.
///
/// `BlogController` becomes `blog`, `UserProfileController` becomes
/// `user-profile`.
pub fn alias_for(name: &str) -> String {
    let name = name.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(name);
    let mut alias = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !alias.ends_with('-') {
                alias.push('-');
            }
            alias.push(c.to_ascii_lowercase());
        } else if c == '_' || c == ' ' {
            alias.push('-');
        } else {
            alias.push(c);
        }
    }
    alias.trim_start_matches('-').to_string()
}

/// Every controller's compiled route table. Read-only once built.
#[derive(Debug)]
pub struct RouteRegistry {
    controllers: Box<[Controller]>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    main: usize,
}

impl RouteRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The default controller, consulted when no alias resolves.
    pub fn main(&self) -> &Controller {
        &self.controllers[self.main]
    }

    pub fn is_main(&self, controller: &Controller) -> bool {
        std::ptr::eq(controller, self.main())
    }

    pub fn controller(&self, name: &str) -> Option<&Controller> {
        self.by_name.get(name).map(|i| &self.controllers[*i])
    }

    pub fn by_alias(&self, alias: &str) -> Option<&Controller> {
        self.by_alias.get(alias).map(|i| &self.controllers[*i])
    }

    /// Routes of `owner` in registration order.
    pub fn lookup(&self, owner: &str) -> Option<&[Route]> {
        self.controller(owner).map(Controller::routes)
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }
}

/// Collects controller declarations and compiles them into a [RouteRegistry].
pub struct RegistryBuilder {
    custom_aliases: Vec<(String, String)>,
    main: Option<ControllerBuilder>,
    controllers: Vec<ControllerBuilder>,
    lint: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            custom_aliases: Vec::new(),
            main: None,
            controllers: Vec::new(),
            lint: true,
        }
    }

    /// Registers a named segment pattern usable through `Rule::alias`.
    pub fn alias(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.custom_aliases.push((name.into(), pattern.into()));
        self
    }

    pub fn main(mut self, controller: ControllerBuilder) -> Self {
        self.main = Some(controller);
        self
    }

    pub fn controller(mut self, controller: ControllerBuilder) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Toggles the startup warning about shadowed routes.
    pub fn lint_shadowed(mut self, enabled: bool) -> Self {
        self.lint = enabled;
        self
    }

    pub fn build(self) -> Result<RouteRegistry, BuildError> {
        let mut aliases = AliasTable::builtin()?;
        for (name, pattern) in self.custom_aliases {
            aliases
                .insert(name.clone(), &pattern)
                .map_err(|source| BuildError::InvalidAlias {
                    alias: name,
                    source,
                })?;
        }
        let main = self.main.ok_or(BuildError::MissingMainController)?;
        let mut controllers = Vec::with_capacity(self.controllers.len() + 1);
        let mut by_name = HashMap::new();
        let mut by_alias = HashMap::new();
        for (i, builder) in std::iter::once(main).chain(self.controllers).enumerate() {
            if by_name.contains_key(builder.name()) {
                return Err(BuildError::DuplicateController(builder.name().to_string()));
            }
            let controller = builder.build(i == 0, &aliases)?;
            if by_alias.contains_key(controller.alias()) {
                return Err(BuildError::DuplicateAlias(controller.alias().to_string()));
            }
            debug!(
                controller = controller.name(),
                alias = controller.alias(),
                routes = controller.routes().len(),
                "Registered controller"
            );
            if self.lint {
                lint_shadowed(&controller);
            }
            by_name.insert(controller.name().to_string(), i);
            by_alias.insert(controller.alias().to_string(), i);
            controllers.push(controller);
        }
        Ok(RouteRegistry {
            controllers: controllers.into_boxed_slice(),
            by_name,
            by_alias,
            main: 0,
        })
    }
}

/// Warns about routes that can never be reached because an earlier route of
/// the same controller has the same path and accepts one of their methods.
fn lint_shadowed(controller: &Controller) -> usize {
    let routes = controller.routes();
    let mut shadowed = 0;
    for (i, route) in routes.iter().enumerate() {
        if let Some(earlier) = routes[..i].iter().find(|earlier| earlier.overlaps(route)) {
            warn!(
                controller = controller.name(),
                path = route.canonical_path(),
                shadowed_by = ?earlier.methods(),
                "Route is shadowed by an earlier registration"
            );
            shadowed += 1;
        }
    }
    shadowed
}
