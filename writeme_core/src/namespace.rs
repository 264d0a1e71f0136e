use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use derive_more::Deref;

use crate::Value;
use crate::WritemeError;
use crate::WritemeResult;

type Callable = dyn Fn(&BoundArguments) -> WritemeResult<Value> + Send + Sync;

/// A declared parameter of a [`RenderingFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
	pub name: String,
	/// The value used when the caller omits this parameter. Parameters without
	/// a default are required.
	pub default: Option<Value>,
}

/// A function that can be called from a writeme block.
#[derive(Clone)]
pub struct RenderingFunction {
	name: String,
	parameters: Vec<Parameter>,
	callable: Arc<Callable>,
}

impl Debug for RenderingFunction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderingFunction")
			.field("name", &self.name)
			.field("parameters", &self.parameters)
			.finish_non_exhaustive()
	}
}

impl RenderingFunction {
	pub fn new<F>(name: impl Into<String>, callable: F) -> Self
	where
		F: Fn(&BoundArguments) -> WritemeResult<Value> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			parameters: vec![],
			callable: Arc::new(callable),
		}
	}

	/// Declare a required parameter.
	#[must_use]
	pub fn param(mut self, name: impl Into<String>) -> Self {
		self.parameters.push(Parameter {
			name: name.into(),
			default: None,
		});
		self
	}

	/// Declare an optional parameter.
	#[must_use]
	pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
		self.parameters.push(Parameter {
			name: name.into(),
			default: Some(default.into()),
		});
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parameters(&self) -> &[Parameter] {
		&self.parameters
	}

	/// Bind `positional` and `keywords` to the declared parameters.
	pub fn bind(
		&self,
		positional: Vec<Value>,
		keywords: Vec<(String, Value)>,
	) -> WritemeResult<BoundArguments> {
		let invalid = |reason: String| {
			WritemeError::InvalidArguments {
				function: self.name.clone(),
				reason,
			}
		};

		if positional.len() > self.parameters.len() {
			return Err(invalid(format!(
				"takes {} argument(s) but {} were given",
				self.parameters.len(),
				positional.len()
			)));
		}

		let mut slots: Vec<Option<Value>> = positional.into_iter().map(Some).collect();
		slots.resize(self.parameters.len(), None);

		for (name, value) in keywords {
			let Some(index) = self.parameters.iter().position(|p| p.name == name) else {
				return Err(invalid(format!("unexpected keyword argument `{name}`")));
			};

			if slots[index].is_some() {
				return Err(invalid(format!("got multiple values for argument `{name}`")));
			}

			slots[index] = Some(value);
		}

		let mut values = BTreeMap::new();
		for (parameter, slot) in self.parameters.iter().zip(slots) {
			let Some(value) = slot.or_else(|| parameter.default.clone()) else {
				return Err(invalid(format!(
					"missing required argument `{}`",
					parameter.name
				)));
			};
			values.insert(parameter.name.clone(), value);
		}

		Ok(BoundArguments {
			function: self.name.clone(),
			values,
		})
	}

	/// Bind the arguments and invoke the function.
	pub fn call(&self, positional: Vec<Value>, keywords: Vec<(String, Value)>) -> WritemeResult<Value> {
		let arguments = self.bind(positional, keywords)?;
		(self.callable)(&arguments)
	}
}

/// Arguments bound to the parameters of a [`RenderingFunction`], keyed by
/// parameter name.
#[derive(Debug, Clone, Deref)]
pub struct BoundArguments {
	function: String,
	#[deref]
	values: BTreeMap<String, Value>,
}

impl BoundArguments {
	fn value(&self, parameter: &str) -> WritemeResult<&Value> {
		self.values.get(parameter).ok_or_else(|| {
			WritemeError::InvalidArguments {
				function: self.function.clone(),
				reason: format!("no parameter named `{parameter}`"),
			}
		})
	}

	fn type_error(&self, parameter: &str, expected: &str, found: &Value) -> WritemeError {
		WritemeError::InvalidArgumentType {
			function: self.function.clone(),
			parameter: parameter.to_string(),
			expected: expected.to_string(),
			found: found.type_name().to_string(),
		}
	}

	pub fn string(&self, parameter: &str) -> WritemeResult<&str> {
		let value = self.value(parameter)?;
		value
			.as_str()
			.ok_or_else(|| self.type_error(parameter, "a string", value))
	}

	pub fn bool(&self, parameter: &str) -> WritemeResult<bool> {
		let value = self.value(parameter)?;
		value
			.as_bool()
			.ok_or_else(|| self.type_error(parameter, "a boolean", value))
	}

	pub fn int(&self, parameter: &str) -> WritemeResult<i64> {
		let value = self.value(parameter)?;
		value
			.as_int()
			.ok_or_else(|| self.type_error(parameter, "an integer", value))
	}
}

/// An entry of an exported [`Environment`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Binding {
	Function(Arc<RenderingFunction>),
	Value(Value),
}

/// A read-only snapshot of a [`Namespace`], handed to the expression
/// evaluator.
#[derive(Debug, Clone, Default, Deref)]
pub struct Environment(HashMap<String, Binding>);

impl Environment {
	/// Bind a global in this snapshot only. Functions keep precedence over
	/// globals of the same name.
	pub fn insert_global(&mut self, name: impl Into<String>, value: Value) {
		let name = name.into();
		if !matches!(self.0.get(&name), Some(Binding::Function(_))) {
			self.0.insert(name, Binding::Value(value));
		}
	}
}

/// The functions and globals visible to writeme blocks.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
	functions: HashMap<String, Arc<RenderingFunction>>,
	globals: HashMap<String, Value>,
}

impl Namespace {
	/// An empty namespace.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `function` under its own name.
	pub fn register(&mut self, function: RenderingFunction) -> WritemeResult<Arc<RenderingFunction>> {
		let name = function.name.clone();
		self.register_as(name, function)
	}

	/// Register `function` under `name`.
	pub fn register_as(
		&mut self,
		name: impl Into<String>,
		mut function: RenderingFunction,
	) -> WritemeResult<Arc<RenderingFunction>> {
		let name = name.into();
		if self.functions.contains_key(&name) {
			return Err(WritemeError::DuplicateRegistration(name));
		}

		tracing::trace!(function = %name, "registering rendering function");
		function.name.clone_from(&name);
		let function = Arc::new(function);
		self.functions.insert(name, Arc::clone(&function));

		Ok(function)
	}

	/// Add a global binding. Last write wins.
	pub fn add_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.globals.insert(name.into(), value.into());
	}

	pub fn contains(&self, name: &str) -> bool {
		self.functions.contains_key(name) || self.globals.contains_key(name)
	}

	pub fn function(&self, name: &str) -> Option<&Arc<RenderingFunction>> {
		self.functions.get(name)
	}

	/// Registered function names, sorted.
	pub fn function_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Snapshot the globals and functions into an [`Environment`]. Functions
	/// shadow globals with the same name.
	pub fn export(&self) -> Environment {
		let mut bindings: HashMap<String, Binding> = self
			.globals
			.iter()
			.map(|(name, value)| (name.clone(), Binding::Value(value.clone())))
			.collect();

		for (name, function) in &self.functions {
			bindings.insert(name.clone(), Binding::Function(Arc::clone(function)));
		}

		Environment(bindings)
	}
}
