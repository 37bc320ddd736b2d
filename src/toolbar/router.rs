use anyhow::Result;

pub struct EventRoute {
    pub pattern: EventPattern,
    pub handler: EventHandler,
}

pub enum EventPattern {
    Exact(String),
    Prefix(String),
}

impl EventPattern {
    pub fn matches(&self, event_id: &str) -> bool {
        match self {
            EventPattern::Exact(s) => s == event_id,
            EventPattern::Prefix(p) => event_id.starts_with(p),
        }
    }

    /// The part of `event_id` after a matched prefix; empty for exact routes.
    fn remainder<'a>(&self, event_id: &'a str) -> &'a str {
        match self {
            EventPattern::Exact(_) => "",
            EventPattern::Prefix(p) => event_id.strip_prefix(p.as_str()).unwrap_or(""),
        }
    }
}

/// Receives the remainder of the event id after the route's prefix.
pub type EventHandler = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Handled,
    NoRoute,
}

/// Routes menu event ids such as `toggle::save` or `runTests::all`.
/// The first matching route wins.
pub struct EventRouter {
    routes: Vec<EventRoute>,
}

impl EventRouter {
    pub fn new(routes: Vec<EventRoute>) -> Self {
        Self { routes }
    }

    pub fn route(&self, event_id: &str) -> Result<RouteOutcome> {
        for route in &self.routes {
            if route.pattern.matches(event_id) {
                (route.handler)(route.pattern.remainder(event_id))?;
                return Ok(RouteOutcome::Handled);
            }
        }

        log::warn!("No route found for menu event: {}", event_id);
        Ok(RouteOutcome::NoRoute)
    }
}
