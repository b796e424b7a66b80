use type_map::TypeMap;

/// Frame-shared singletons keyed by type.
pub struct Resources {
    map: TypeMap,
}

impl Resources {
    pub fn new() -> Self {
        Resources {
            map: TypeMap::new(),
        }
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut()
    }

    /// Replaces stored value, returning previous one.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map.insert(value)
    }

    pub fn get_or_default<T>(&mut self) -> &mut T
    where
        T: Default + 'static,
    {
        self.map.entry::<T>().or_insert_with(T::default)
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources::new()
    }
}
