// Esquema Diesel del almacén clave-valor.
// Tabla: kv_entries (una fila por clave dentro de un namespace)
diesel::table! {
    kv_entries (namespace, key) {
        namespace -> Text,
        key -> Text,
        value -> Text,
    }
}
