use std::collections::VecDeque;

use crate::types::{PostureLabel, SmoothedLabel};

/// Capacidad por defecto de la ventana de suavizado (~0.5 s a 33 Hz)
pub const VENTANA_PREDICCION: usize = 15;

/// Ventana acotada de las últimas predicciones crudas del clasificador.
///
/// Las predicciones por frame son ruidosas cerca de las transiciones de
/// postura; el voto mayoritario sobre una ventana corta cambia un poco
/// de retardo por mucha menos oscilación en el estado mostrado y en la
/// alarma.
pub struct PredictionFilter {
    ventana: VecDeque<PostureLabel>,
    capacidad: usize,
}

impl PredictionFilter {
    pub fn new(capacidad: usize) -> Self {
        Self {
            ventana: VecDeque::with_capacity(capacidad),
            capacidad,
        }
    }

    /// Añade una predicción cruda, expulsando la más vieja si la ventana
    /// está llena
    pub fn agregar(&mut self, prediccion: PostureLabel) {
        if self.ventana.len() == self.capacidad {
            self.ventana.pop_front();
        }
        self.ventana.push_back(prediccion);
    }

    /// Etiqueta más frecuente en la ventana. Un empate lo gana la
    /// primera etiqueta que alcanzó el máximo en orden de inserción.
    /// Con la ventana vacía devuelve `Buscando`.
    pub fn dominante(&self) -> SmoothedLabel {
        if self.ventana.is_empty() {
            return SmoothedLabel::Buscando;
        }

        let mut conteos: Vec<(PostureLabel, usize)> = Vec::new();
        for &prediccion in &self.ventana {
            match conteos.iter_mut().find(|(etiqueta, _)| *etiqueta == prediccion) {
                Some((_, cuenta)) => *cuenta += 1,
                None => conteos.push((prediccion, 1)),
            }
        }

        let mut dominante = conteos[0];
        for &candidata in &conteos[1..] {
            if candidata.1 > dominante.1 {
                dominante = candidata;
            }
        }

        SmoothedLabel::Etiqueta(dominante.0)
    }

    pub fn len(&self) -> usize {
        self.ventana.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ventana.is_empty()
    }

    /// Vacía la ventana (al arrancar una nueva sesión de detección)
    pub fn limpiar(&mut self) {
        self.ventana.clear();
    }
}

impl Default for PredictionFilter {
    fn default() -> Self {
        Self::new(VENTANA_PREDICCION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ventana_vacia_devuelve_buscando() {
        let filtro = PredictionFilter::default();
        assert_eq!(filtro.dominante(), SmoothedLabel::Buscando);
    }

    #[test]
    fn test_mayoria_simple() {
        let mut filtro = PredictionFilter::new(5);
        filtro.agregar(PostureLabel::Malo);
        filtro.agregar(PostureLabel::Perfecto);
        filtro.agregar(PostureLabel::Malo);

        assert_eq!(
            filtro.dominante(),
            SmoothedLabel::Etiqueta(PostureLabel::Malo)
        );
    }

    #[test]
    fn test_capacidad_expulsa_la_mas_vieja() {
        let mut filtro = PredictionFilter::new(3);

        // 5 inserciones en ventana de 3: sobreviven las últimas 3
        filtro.agregar(PostureLabel::Malo);
        filtro.agregar(PostureLabel::Malo);
        filtro.agregar(PostureLabel::Perfecto);
        filtro.agregar(PostureLabel::Perfecto);
        filtro.agregar(PostureLabel::Perfecto);

        assert_eq!(filtro.len(), 3);
        assert_eq!(
            filtro.dominante(),
            SmoothedLabel::Etiqueta(PostureLabel::Perfecto)
        );
    }

    #[test]
    fn test_empate_lo_gana_la_primera_en_insertarse() {
        let mut filtro = PredictionFilter::new(10);

        // 3 a 3: gana Aceptable por haberse encontrado primero
        for _ in 0..3 {
            filtro.agregar(PostureLabel::Aceptable);
        }
        for _ in 0..3 {
            filtro.agregar(PostureLabel::Malo);
        }

        assert_eq!(
            filtro.dominante(),
            SmoothedLabel::Etiqueta(PostureLabel::Aceptable)
        );
    }

    #[test]
    fn test_limpiar_vuelve_a_buscando() {
        let mut filtro = PredictionFilter::default();
        filtro.agregar(PostureLabel::Perfecto);
        filtro.limpiar();

        assert!(filtro.is_empty());
        assert_eq!(filtro.dominante(), SmoothedLabel::Buscando);
    }
}
